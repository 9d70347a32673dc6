//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use edge_router::binder::Annotations;
use edge_router::cluster::{Cluster, ClusterError, ClusterResult, SecretData, Service};
use edge_router::proxy::{ReloadError, Reloader};

pub const NAMESPACE: &str = "default";
pub const PREFIX: &str = "router.deis.io";

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct State {
    workload: Option<Annotations>,
    routable: Vec<Service>,
    other: Vec<Service>,
    ready: HashSet<Key>,
    secrets: HashMap<Key, SecretData>,
    broken_secrets: HashSet<Key>,
    fail_listing: bool,
}

/// In-memory cluster. Services added with `add_routable` are returned by
/// `list_services` in insertion order, whatever the selector.
#[derive(Default)]
pub struct MemoryCluster {
    state: Mutex<State>,
    secret_reads: AtomicUsize,
}

impl MemoryCluster {
    /// A cluster with an unannotated router deployment.
    pub fn new() -> Self {
        let cluster = Self::default();
        cluster.set_router_annotations(&[]);
        cluster
    }

    pub fn set_router_annotations(&self, pairs: &[(&str, &str)]) {
        self.state.lock().unwrap().workload = Some(annotations(pairs));
    }

    pub fn remove_router(&self) {
        self.state.lock().unwrap().workload = None;
    }

    /// Add a routable service with a ready endpoint.
    pub fn add_routable(&self, service: Service) {
        let mut state = self.state.lock().unwrap();
        state.ready.insert(key(&service.namespace, &service.name));
        state.routable.push(service);
    }

    /// Add a service that is not routable (e.g. the builder).
    pub fn add_service(&self, service: Service) {
        self.state.lock().unwrap().other.push(service);
    }

    pub fn set_ready(&self, namespace: &str, name: &str, ready: bool) {
        let mut state = self.state.lock().unwrap();
        if ready {
            state.ready.insert(key(namespace, name));
        } else {
            state.ready.remove(&key(namespace, name));
        }
    }

    pub fn add_secret(&self, namespace: &str, name: &str, entries: &[(&str, &str)]) {
        let data = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        self.state.lock().unwrap().secrets.insert(key(namespace, name), data);
    }

    pub fn add_tls_secret(&self, namespace: &str, name: &str, cert: &str, tls_key: &str) {
        self.add_secret(namespace, name, &[("tls.crt", cert), ("tls.key", tls_key)]);
    }

    /// Make reads of this secret fail with a server error.
    pub fn break_secret(&self, namespace: &str, name: &str) {
        self.state.lock().unwrap().broken_secrets.insert(key(namespace, name));
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    pub fn secret_reads(&self) -> usize {
        self.secret_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cluster for MemoryCluster {
    async fn fetch_workload(&self, namespace: &str, name: &str) -> ClusterResult<Annotations> {
        self.state
            .lock()
            .unwrap()
            .workload
            .clone()
            .ok_or_else(|| ClusterError::Missing {
                kind: "deployment",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list_services(&self, _selector: &str) -> ClusterResult<Vec<Service>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(ClusterError::Status {
                path: "/api/v1/services".to_string(),
                status: 500,
            });
        }
        Ok(state.routable.clone())
    }

    async fn fetch_service(&self, namespace: &str, name: &str) -> ClusterResult<Option<Service>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .routable
            .iter()
            .chain(state.other.iter())
            .find(|s| s.namespace == namespace && s.name == name)
            .cloned())
    }

    async fn fetch_endpoints_ready(&self, service: &Service) -> ClusterResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.ready.contains(&key(&service.namespace, &service.name)))
    }

    async fn fetch_secret(&self, namespace: &str, name: &str) -> ClusterResult<Option<SecretData>> {
        self.secret_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.broken_secrets.contains(&key(namespace, name)) {
            return Err(ClusterError::Status {
                path: format!("/api/v1/namespaces/{}/secrets/{}", namespace, name),
                status: 500,
            });
        }
        Ok(state.secrets.get(&key(namespace, name)).cloned())
    }
}

/// Counts reloads; can be switched to fail.
#[derive(Default)]
pub struct RecordingReloader {
    reloads: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingReloader {
    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Reloader for RecordingReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReloadError::Exit {
                command: "nginx -s reload".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "nginx: [emerg] test failure".to_string(),
            });
        }
        Ok(())
    }
}

pub fn annotations(pairs: &[(&str, &str)]) -> Annotations {
    pairs
        .iter()
        .map(|(k, v)| (format!("{}/{}", PREFIX, k), v.to_string()))
        .collect()
}

/// A service carrying `router.deis.io/<key>` annotations.
pub fn service(namespace: &str, name: &str, cluster_ip: &str, pairs: &[(&str, &str)]) -> Service {
    Service {
        name: name.to_string(),
        namespace: namespace.to_string(),
        cluster_ip: cluster_ip.to_string(),
        annotations: annotations(pairs),
        ..Service::default()
    }
}

/// Give a service an `app` label, which names its app.
pub fn labelled(mut service: Service, app: &str) -> Service {
    service.labels.insert("app".to_string(), app.to_string());
    service
}
