//! Controller settings.
//!
//! These configure the router controller itself (where to look in the
//! cluster, where to write, how fast to poll). Routing configuration comes
//! from cluster annotations instead, see `crate::model`.

use serde::{Deserialize, Serialize};

/// Root settings for the router controller.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Which cluster objects drive the router.
    pub discovery: DiscoverySettings,

    /// Where the proxy's files live and how it is reloaded.
    pub proxy: ProxySettings,

    /// Reconcile loop pacing.
    pub reconcile: ReconcileSettings,

    /// Cluster API client settings.
    pub cluster: ClusterSettings,

    /// Logging and metrics.
    pub observability: ObservabilitySettings,
}

/// Names of the cluster objects the synthesizer reads.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Namespace the router itself runs in.
    pub namespace: String,

    /// Annotation and label prefix (e.g. `router.deis.io`).
    pub annotation_prefix: String,

    /// The router's own deployment, whose annotations configure the router.
    pub router_deployment: String,

    /// Optional builder service in the router's namespace.
    pub builder_service: String,

    /// Secret holding the platform-wide certificate.
    pub platform_cert_secret: String,

    /// Secret holding DH parameters.
    pub dhparam_secret: String,
}

impl DiscoverySettings {
    /// Label selector matching routable services.
    pub fn routable_selector(&self) -> String {
        format!("{}/routable=true", self.annotation_prefix)
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            annotation_prefix: "router.deis.io".to_string(),
            router_deployment: "deis-router".to_string(),
            builder_service: "deis-builder".to_string(),
            platform_cert_secret: "deis-router-platform-cert".to_string(),
            dhparam_secret: "deis-router-dhparam".to_string(),
        }
    }
}

/// Proxy filesystem layout and reload command.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxySettings {
    /// Directory receiving certificate/key pairs and DH parameters.
    pub ssl_dir: String,

    /// Rendered proxy configuration file.
    pub config_file: String,

    /// Command (program followed by arguments) telling the proxy to reload.
    pub reload_command: Vec<String>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            ssl_dir: "/opt/router/ssl".to_string(),
            config_file: "/opt/router/conf/nginx.conf".to_string(),
            reload_command: vec!["nginx".to_string(), "-s".to_string(), "reload".to_string()],
        }
    }
}

/// Reconcile loop pacing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReconcileSettings {
    /// Ticks per second.
    pub ticks_per_second: f64,

    /// Ticks that may run back to back.
    pub burst: u32,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            ticks_per_second: 0.1,
            burst: 1,
        }
    }
}

/// Cluster API client settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClusterSettings {
    /// API server URL; derived from the in-cluster environment when unset.
    pub api_server: Option<String>,

    /// Directory with the service-account `token` and `ca.crt`.
    pub service_account_dir: String,

    /// Client-side request rate limit.
    pub client_qps: f64,

    /// Client-side request burst.
    pub client_burst: u32,

    /// Per-request timeout in seconds. None means wait indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            api_server: None,
            service_account_dir: "/var/run/secrets/kubernetes.io/serviceaccount".to_string(),
            client_qps: 5.0,
            client_burst: 10,
            request_timeout_secs: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "edge_router=info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9091".to_string(),
        }
    }
}
