//! Routing configuration model.
//!
//! # Structure
//! ```text
//! RouterConfig (one snapshot per tick)
//!     ├── GzipConfig, SslConfig → HstsConfig, ProxyBuffersConfig
//!     ├── AppConfig* (one per routable service with domains)
//!     │     ├── SslConfig, NginxAppConfig → ProxyBuffersConfig
//!     │     ├── certificates: domain → Certificate
//!     │     └── locations: [Location { owner: app index, path }], always ending in "/"
//!     ├── BuilderConfig?
//!     └── platform_certificate: Certificate?
//! ```
//!
//! # Design Decisions
//! - Pure data: every type has defaults and a binding schema, nothing else
//! - Snapshots are compared with derived `PartialEq` for change detection
//! - Ordered maps keep rendering and materialization deterministic

pub mod app;
pub mod router;
pub mod tls;

pub use app::{AppConfig, BuilderConfig, Location, NginxAppConfig};
pub use router::{GzipConfig, ProxyBuffersConfig, RouterConfig};
pub use tls::{Certificate, HstsConfig, SslConfig};
