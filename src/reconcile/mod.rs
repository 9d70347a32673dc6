//! Reconciliation loop.
//!
//! # Data Flow
//! ```text
//! RateLimiter token (ticks_per_second, burst)
//!     → Synthesizer::build (cluster reads)
//!         → error: log, count, wait for next token
//!     → compare with last applied snapshot
//!         → equal: nothing touches disk
//!     → apply: certs → dhparam → render → write config → reload
//!         → error: log, count, keep previous last-applied
//!     → record snapshot as last applied
//! ```
//!
//! # Design Decisions
//! - Ticks never overlap; one tick runs to completion before the next token
//! - No error is fatal to the loop
//! - A snapshot counts as applied only after the reload succeeds, so a
//!   failed apply is retried on the next tick even if nothing changed

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::cluster::Cluster;
use crate::config::{ProxySettings, ReconcileSettings};
use crate::materialize::{self, MaterializeError};
use crate::model::RouterConfig;
use crate::observability::metrics;
use crate::proxy::{ReloadError, RenderError, Reloader, Renderer};
use crate::resilience::RateLimiter;
use crate::synth::Synthesizer;

/// Result of one reconcile tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Snapshot equal to the last applied one; nothing written.
    Unchanged,
    /// New snapshot written and the proxy reloaded.
    Applied,
    /// Cluster reads or linking failed; nothing written.
    SynthesisFailed,
    /// Writing or reloading failed part way.
    ApplyFailed,
}

impl TickOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickOutcome::Unchanged => "unchanged",
            TickOutcome::Applied => "applied",
            TickOutcome::SynthesisFailed => "synthesis_failed",
            TickOutcome::ApplyFailed => "apply_failed",
        }
    }
}

/// Errors that abort applying a snapshot.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("failed to write certificates: {0}")]
    Certificates(#[source] MaterializeError),

    #[error("failed to write DH parameters: {0}")]
    DhParam(#[source] MaterializeError),

    #[error("failed to render proxy configuration: {0}")]
    Render(#[from] RenderError),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to reload proxy: {0}")]
    Reload(#[from] ReloadError),
}

impl ApplyError {
    /// Short stage name, used as a metric label.
    pub fn stage(&self) -> &'static str {
        match self {
            ApplyError::Certificates(_) => "certificates",
            ApplyError::DhParam(_) => "dhparam",
            ApplyError::Render(_) => "render",
            ApplyError::Write { .. } => "write",
            ApplyError::Reload(_) => "reload",
        }
    }
}

/// Drives cluster state into the proxy, one rate-limited tick at a time.
pub struct Reconciler {
    cluster: Arc<dyn Cluster>,
    synthesizer: Synthesizer,
    renderer: Arc<dyn Renderer>,
    reloader: Arc<dyn Reloader>,
    ssl_dir: PathBuf,
    config_file: PathBuf,
    limiter: RateLimiter,
    last_applied: Option<RouterConfig>,
    ticks: u64,
}

impl Reconciler {
    pub fn new(
        cluster: Arc<dyn Cluster>,
        synthesizer: Synthesizer,
        renderer: Arc<dyn Renderer>,
        reloader: Arc<dyn Reloader>,
        proxy: &ProxySettings,
        reconcile: &ReconcileSettings,
    ) -> Self {
        Self {
            cluster,
            synthesizer,
            renderer,
            reloader,
            ssl_dir: PathBuf::from(&proxy.ssl_dir),
            config_file: PathBuf::from(&proxy.config_file),
            limiter: RateLimiter::new(reconcile.ticks_per_second, reconcile.burst),
            last_applied: None,
            ticks: 0,
        }
    }

    /// The snapshot most recently applied successfully.
    pub fn last_applied(&self) -> Option<&RouterConfig> {
        self.last_applied.as_ref()
    }

    /// Tick until shutdown is signalled. A tick in progress always completes.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            namespace = %self.synthesizer.discovery().namespace,
            ssl_dir = %self.ssl_dir.display(),
            config_file = %self.config_file.display(),
            "Reconcile loop starting"
        );

        loop {
            let proceed = tokio::select! {
                _ = self.limiter.acquire() => true,
                _ = shutdown.recv() => false,
            };
            if !proceed {
                tracing::info!(
                    ticks = self.ticks,
                    "Reconcile loop received shutdown signal, exiting"
                );
                break;
            }
            self.run_once().await;
        }
    }

    /// Run a single tick: synthesize, compare, apply.
    pub async fn run_once(&mut self) -> TickOutcome {
        self.ticks += 1;
        let span = tracing::info_span!("tick", tick = self.ticks);
        let outcome = self.tick().instrument(span).await;
        metrics::record_tick(outcome.as_str());
        outcome
    }

    async fn tick(&mut self) -> TickOutcome {
        let config = match self.synthesizer.build(self.cluster.as_ref()).await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to synthesize router configuration");
                return TickOutcome::SynthesisFailed;
            }
        };
        metrics::record_apps(config.app_configs.len());

        if self.last_applied.as_ref() == Some(&config) {
            tracing::debug!("Router configuration unchanged");
            return TickOutcome::Unchanged;
        }

        tracing::info!(apps = config.app_configs.len(), "Router configuration changed, applying");
        match self.apply(&config).await {
            Ok(()) => {
                tracing::info!("Router configuration applied");
                self.last_applied = Some(config);
                TickOutcome::Applied
            }
            Err(e) => {
                tracing::error!(
                    stage = e.stage(),
                    error = %e,
                    "Failed to apply router configuration"
                );
                metrics::record_apply_failure(e.stage());
                TickOutcome::ApplyFailed
            }
        }
    }

    async fn apply(&self, config: &RouterConfig) -> Result<(), ApplyError> {
        materialize::write_certs(config, &self.ssl_dir).map_err(ApplyError::Certificates)?;
        materialize::write_dhparam(config, &self.ssl_dir).map_err(ApplyError::DhParam)?;

        let rendered = self.renderer.render(config)?;
        write_config(&self.config_file, &rendered).await?;

        self.reloader.reload().await?;
        Ok(())
    }
}

async fn write_config(path: &Path, contents: &str) -> Result<(), ApplyError> {
    let write_err = |source| ApplyError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(path, contents).await.map_err(write_err)
}
