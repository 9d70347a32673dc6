//! Edge router control plane.
//!
//! Watches cluster state and keeps an nginx edge proxy configured to match:
//! annotations on the router deployment and on routable services are bound
//! into a typed snapshot, certificates are materialized to disk, and the
//! proxy configuration is rendered and reloaded whenever the snapshot changes.

// Core pipeline
pub mod binder;
pub mod cluster;
pub mod materialize;
pub mod model;
pub mod proxy;
pub mod reconcile;
pub mod synth;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::Settings;
pub use lifecycle::Shutdown;
pub use model::RouterConfig;
pub use reconcile::{Reconciler, TickOutcome};
pub use synth::Synthesizer;
