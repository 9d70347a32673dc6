//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → reconcile loop finishes its current tick → exit
//! ```
//!
//! # Design Decisions
//! - A tick in progress always completes; shutdown is only observed between ticks
//! - One broadcast channel, any number of subscribers

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
