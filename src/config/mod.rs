//! Controller settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional)
//!     → loader.rs (parse & deserialize over defaults)
//!     → environment overrides (POD_NAMESPACE, RATE_LIMIT_QPS, RATE_LIMIT_BURST)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → handed to the synthesizer, cluster client and reconcile loop
//! ```
//!
//! # Design Decisions
//! - Settings are built once at startup and passed explicitly
//! - All fields have defaults so the controller runs with no file at all
//! - Routing configuration is NOT here; it comes from cluster annotations

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, EnvOverride, SettingsError};
pub use schema::{
    ClusterSettings, DiscoverySettings, LogFormat, ObservabilitySettings, ProxySettings,
    ReconcileSettings, Settings,
};
