//! Proxy configuration rendering and reload.
//!
//! # Data Flow
//! ```text
//! RouterConfig snapshot
//!     → Renderer (nginx.rs): snapshot → nginx.conf text
//!     → reconcile loop writes the text to the configured path
//!     → Reloader (reload.rs): signal the running proxy to adopt it
//! ```
//!
//! # Design Decisions
//! - Rendering is pure and stateless; the same snapshot renders the same text
//! - No artifact validation; a malformed file surfaces as a reload error
//! - Both seams are traits so the loop can be driven without a real proxy

pub mod nginx;
pub mod reload;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::RouterConfig;

pub use nginx::NginxRenderer;
pub use reload::CommandReloader;

/// Errors raised while rendering proxy configuration.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format proxy configuration: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Errors raised while reloading the proxy.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("no reload command configured")]
    NoCommand,

    #[error("failed to run reload command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("reload command '{command}' exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Turns a snapshot into the proxy's native configuration text.
pub trait Renderer: Send + Sync {
    fn render(&self, config: &RouterConfig) -> Result<String, RenderError>;
}

/// Instructs the running proxy to pick up a freshly written configuration.
#[async_trait]
pub trait Reloader: Send + Sync {
    async fn reload(&self) -> Result<(), ReloadError>;
}
