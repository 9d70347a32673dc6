//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per reconcile tick)
//!     → metrics.rs (tick outcomes, app count, apply failures)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - `tracing` everywhere; the subscriber is installed once in the binary
//! - Recording metrics without an installed exporter is a no-op

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingError};
