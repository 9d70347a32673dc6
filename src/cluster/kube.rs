//! In-cluster Kubernetes REST client.
//!
//! # Responsibilities
//! - Authenticate with the pod's service-account token and CA bundle
//! - Issue the handful of GETs the synthesizer needs
//! - Map HTTP 404 to `None` and decode base64 secret data
//! - Throttle requests client-side (QPS / burst)

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::binder::Annotations;
use crate::cluster::{Cluster, ClusterError, ClusterResult, SecretData, Service};
use crate::config::ClusterSettings;
use crate::resilience::rate_limit::RateLimiter;

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    metadata: ObjectMeta,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSpec {
    #[serde(rename = "clusterIP", default)]
    cluster_ip: String,
}

#[derive(Debug, Deserialize)]
struct ServiceObject {
    metadata: ObjectMeta,
    #[serde(default)]
    spec: ServiceSpec,
}

impl From<ServiceObject> for Service {
    fn from(obj: ServiceObject) -> Self {
        Service {
            name: obj.metadata.name,
            namespace: obj.metadata.namespace,
            labels: obj.metadata.labels,
            annotations: obj.metadata.annotations,
            cluster_ip: obj.spec.cluster_ip,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    items: Vec<ServiceObject>,
}

#[derive(Debug, Deserialize)]
struct EndpointSubset {
    #[serde(default)]
    addresses: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Endpoints {
    #[serde(default)]
    subsets: Vec<EndpointSubset>,
}

#[derive(Debug, Deserialize)]
struct Secret {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

/// Kubernetes API client authenticated as the pod's service account.
pub struct KubeClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    throttle: RateLimiter,
}

impl KubeClient {
    /// Build a client from the service-account files mounted into the pod.
    pub fn in_cluster(settings: &ClusterSettings) -> ClusterResult<Self> {
        let base = match &settings.api_server {
            Some(url) => url.clone(),
            None => {
                let host = std::env::var("KUBERNETES_SERVICE_HOST")
                    .map_err(|_| {
                        ClusterError::Setup("KUBERNETES_SERVICE_HOST is not set".to_string())
                    })?;
                let port = std::env::var("KUBERNETES_SERVICE_PORT")
                    .unwrap_or_else(|_| "443".to_string());
                if host.contains(':') {
                    format!("https://[{}]:{}", host, port)
                } else {
                    format!("https://{}:{}", host, port)
                }
            }
        };
        let base_url = Url::parse(&base)
            .map_err(|e| ClusterError::Setup(format!("invalid API server URL '{}': {}", base, e)))?;

        let account_dir = Path::new(&settings.service_account_dir);
        let token = fs::read_to_string(account_dir.join("token"))
            .map_err(|e| {
                ClusterError::Setup(format!("failed to read service account token: {}", e))
            })?;
        let ca = fs::read(account_dir.join("ca.crt"))
            .map_err(|e| ClusterError::Setup(format!("failed to read cluster CA: {}", e)))?;
        let ca = reqwest::Certificate::from_pem(&ca)
            .map_err(|e| ClusterError::Setup(format!("invalid cluster CA: {}", e)))?;

        let mut builder = reqwest::Client::builder().add_root_certificate(ca);
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ClusterError::Setup(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(
            api_server = %base_url,
            qps = settings.client_qps,
            burst = settings.client_burst,
            "Cluster client initialized"
        );

        Ok(Self::with_client(http, base_url, token.trim().to_string(), settings))
    }

    /// Build a client from explicit parts.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        token: String,
        settings: &ClusterSettings,
    ) -> Self {
        Self {
            http,
            base_url,
            token,
            throttle: RateLimiter::new(settings.client_qps, settings.client_burst),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClusterResult<Option<T>> {
        self.throttle.acquire().await;

        let url = self.base_url.join(path).map_err(|e| ClusterError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ClusterError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClusterError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map(Some).map_err(|e| ClusterError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Cluster for KubeClient {
    async fn fetch_workload(&self, namespace: &str, name: &str) -> ClusterResult<Annotations> {
        let path = format!("/apis/apps/v1/namespaces/{}/deployments/{}", namespace, name);
        match self.get::<Deployment>(&path, &[]).await? {
            Some(deployment) => Ok(deployment.metadata.annotations),
            None => Err(ClusterError::Missing {
                kind: "deployment",
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
        }
    }

    async fn list_services(&self, selector: &str) -> ClusterResult<Vec<Service>> {
        let list = self
            .get::<ServiceList>("/api/v1/services", &[("labelSelector", selector)])
            .await?;
        Ok(list
            .map(|l| l.items.into_iter().map(Service::from).collect())
            .unwrap_or_default())
    }

    async fn fetch_service(&self, namespace: &str, name: &str) -> ClusterResult<Option<Service>> {
        let path = format!("/api/v1/namespaces/{}/services/{}", namespace, name);
        Ok(self.get::<ServiceObject>(&path, &[]).await?.map(Service::from))
    }

    async fn fetch_endpoints_ready(&self, service: &Service) -> ClusterResult<bool> {
        let path = format!("/api/v1/namespaces/{}/endpoints/{}", service.namespace, service.name);
        let endpoints = self.get::<Endpoints>(&path, &[]).await?;
        Ok(endpoints.is_some_and(|e| has_ready_address(&e)))
    }

    async fn fetch_secret(&self, namespace: &str, name: &str) -> ClusterResult<Option<SecretData>> {
        let path = format!("/api/v1/namespaces/{}/secrets/{}", namespace, name);
        match self.get::<Secret>(&path, &[]).await? {
            Some(secret) => decode_secret(&path, secret).map(Some),
            None => Ok(None),
        }
    }
}

fn has_ready_address(endpoints: &Endpoints) -> bool {
    endpoints
        .subsets
        .first()
        .is_some_and(|subset| !subset.addresses.is_empty())
}

fn decode_secret(path: &str, secret: Secret) -> ClusterResult<SecretData> {
    secret
        .data
        .into_iter()
        .map(|(key, value)| {
            STANDARD
                .decode(value.as_bytes())
                .map(|bytes| (key.clone(), bytes))
                .map_err(|e| ClusterError::Decode {
                    path: path.to_string(),
                    reason: format!("entry '{}' is not valid base64: {}", key, e),
                })
        })
        .collect()
}
