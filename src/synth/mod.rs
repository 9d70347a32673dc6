//! Configuration synthesis subsystem.
//!
//! # Data Flow
//! ```text
//! Cluster reads (one tick, sequential):
//!     router deployment annotations
//!     routable services, builder service
//!     platform cert secret, dhparam secret
//!     → RouterConfig defaults → bind "nginx" scope
//!     → per service: AppConfig defaults → bind → certificates → availability
//!     → links.rs: cross-app proxy locations, then root "/" locations
//!     → builder config
//!     → RouterConfig snapshot
//! ```
//!
//! # Design Decisions
//! - Every tick re-reads everything; nothing is cached across ticks
//! - Bad annotations and missing certificates degrade, they never abort
//! - Fetch failures and dangling proxy domains abort the tick

pub mod apps;
pub mod links;

use thiserror::Error;

use crate::binder::{Annotations, Binder};
use crate::cluster::{Cluster, ClusterError, SecretData};
use crate::config::DiscoverySettings;
use crate::model::RouterConfig;

/// A cluster-declared configuration that cannot be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("can't find proxy domain '{domain}' (declared by app '{app}') in any application")]
    MissingProxyDomain { domain: String, app: String },
}

/// Errors that abort synthesis for a tick.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("failed to read cluster state: {0}")]
    Fetch(#[from] ClusterError),

    #[error("invalid routing configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for synthesis.
pub type SynthResult<T> = Result<T, SynthError>;

/// Builds configuration snapshots from cluster state.
pub struct Synthesizer {
    discovery: DiscoverySettings,
    binder: Binder,
}

impl Synthesizer {
    pub fn new(discovery: DiscoverySettings) -> Self {
        let binder = Binder::new(discovery.annotation_prefix.clone());
        Self { discovery, binder }
    }

    pub fn discovery(&self) -> &DiscoverySettings {
        &self.discovery
    }

    /// Read the cluster and build a complete snapshot.
    pub async fn build<C: Cluster + ?Sized>(&self, cluster: &C) -> SynthResult<RouterConfig> {
        let d = &self.discovery;

        let router_annotations = cluster.fetch_workload(&d.namespace, &d.router_deployment).await?;
        let services = cluster.list_services(&d.routable_selector()).await?;
        let builder_service = cluster.fetch_service(&d.namespace, &d.builder_service).await?;
        let platform_secret = cluster.fetch_secret(&d.namespace, &d.platform_cert_secret).await?;
        let dhparam_secret = cluster.fetch_secret(&d.namespace, &d.dhparam_secret).await?;

        let mut router = self.build_router_config(
            &router_annotations,
            platform_secret.as_ref(),
            dhparam_secret.as_ref(),
        );

        for service in &services {
            if let Some(app) =
                apps::build_app_config(cluster, &self.binder, service, &router).await?
            {
                router.app_configs.push(app);
            }
        }

        for (domain, first, shadowed) in links::duplicate_domains(&router.app_configs) {
            tracing::warn!(
                domain = %domain,
                app = %first,
                shadowed = %shadowed,
                "Domain claimed by more than one app; proxy locations resolve to the first listed"
            );
        }

        links::link_locations(&mut router.app_configs)?;
        links::add_root_locations(&mut router.app_configs);

        router.builder_config = builder_service
            .as_ref()
            .map(|service| apps::build_builder_config(&self.binder, service));

        tracing::debug!(
            apps = router.app_configs.len(),
            builder = router.builder_config.is_some(),
            "Synthesized router configuration"
        );
        Ok(router)
    }

    /// Router-wide settings from the router's annotations and secrets.
    pub fn build_router_config(
        &self,
        annotations: &Annotations,
        platform_secret: Option<&SecretData>,
        dhparam_secret: Option<&SecretData>,
    ) -> RouterConfig {
        let mut router = RouterConfig::default();
        self.binder.bind(annotations, "nginx", &mut router);

        router.platform_certificate =
            platform_secret.and_then(|data| apps::certificate_from_secret(data, "platform"));

        if let Some(data) = dhparam_secret {
            router.ssl.dh_param = apps::dhparam_from_secret(data);
        }
        router
    }
}
