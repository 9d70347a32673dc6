//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! reconcile loop ── acquire() ──▶ RateLimiter (ticks_per_second, burst)
//! cluster client ── acquire() ──▶ RateLimiter (client_qps, client_burst)
//! ```
//!
//! # Design Decisions
//! - Pacing only; a failed tick is simply retried on the next token
//! - Limiters wait on tokio time so tests can run with paused clocks

pub mod rate_limit;

pub use rate_limit::RateLimiter;
