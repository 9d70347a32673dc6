//! Cluster API facade.
//!
//! # Data Flow
//! ```text
//! Synthesizer
//!     → Cluster trait (fetch_workload, list_services, fetch_service,
//!                      fetch_endpoints_ready, fetch_secret)
//!     → kube.rs (in-cluster REST client, throttled)
//! ```
//!
//! # Design Decisions
//! - Not-found is `Ok(None)`, never an error
//! - Any other failure is a `ClusterError` and aborts the current tick
//! - No caching: every call reads live cluster state

pub mod kube;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::binder::Annotations;

pub use kube::KubeClient;

/// Decoded secret entries.
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// The parts of a cluster service the router consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    pub labels: Annotations,
    pub annotations: Annotations,
    pub cluster_ip: String,
}

/// Errors that can occur while reading cluster state.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The request could not be sent or the connection failed.
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with an unexpected status.
    #[error("unexpected status {status} from {path}")]
    Status { path: String, status: u16 },

    /// The response body could not be decoded.
    #[error("malformed response from {path}: {reason}")]
    Decode { path: String, reason: String },

    /// A required object does not exist.
    #[error("{kind} {namespace}/{name} not found")]
    Missing {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// The client could not be constructed.
    #[error("cluster client setup failed: {0}")]
    Setup(String),
}

/// Result type for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Read access to the cluster objects the router is driven by.
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Annotations of the router's own workload.
    async fn fetch_workload(&self, namespace: &str, name: &str) -> ClusterResult<Annotations>;

    /// All services, across namespaces, matching a label selector.
    async fn list_services(&self, selector: &str) -> ClusterResult<Vec<Service>>;

    /// A single service, if it exists.
    async fn fetch_service(&self, namespace: &str, name: &str) -> ClusterResult<Option<Service>>;

    /// Whether the service currently has at least one ready endpoint address.
    async fn fetch_endpoints_ready(&self, service: &Service) -> ClusterResult<bool>;

    /// A secret's decoded data, if the secret exists.
    async fn fetch_secret(&self, namespace: &str, name: &str) -> ClusterResult<Option<SecretData>>;
}
