//! Per-service app synthesis and certificate resolution.

use crate::binder::Binder;
use crate::cluster::{Cluster, SecretData, Service};
use crate::model::{AppConfig, BuilderConfig, Certificate, RouterConfig};
use crate::synth::SynthResult;

const CERT_ENTRY: &str = "tls.crt";
const KEY_ENTRY: &str = "tls.key";
const DHPARAM_ENTRY: &str = "dhparam";

/// App name for a service: the `app` label, else the service name,
/// qualified by namespace unless the two are equal.
pub fn app_name(service: &Service) -> String {
    let name = service
        .labels
        .get("app")
        .filter(|label| !label.is_empty())
        .unwrap_or(&service.name);

    if *name == service.namespace {
        name.clone()
    } else {
        format!("{}/{}", service.namespace, name)
    }
}

/// Build the app for one routable service. Services without domains yield `None`.
pub async fn build_app_config<C: Cluster + ?Sized>(
    cluster: &C,
    binder: &Binder,
    service: &Service,
    router: &RouterConfig,
) -> SynthResult<Option<AppConfig>> {
    let mut app = AppConfig::new(router);
    app.name = app_name(service);
    binder.bind(&service.annotations, "", &mut app);

    if app.domains.is_empty() {
        tracing::debug!(app = %app.name, "Service declares no domains, skipping");
        return Ok(None);
    }

    resolve_certificates(cluster, service, router, &mut app).await;

    app.service_ip = service.cluster_ip.clone();
    app.available = cluster.fetch_endpoints_ready(service).await?;

    Ok(Some(app))
}

/// Bind a certificate to each domain that can have one.
///
/// Bare domains take the platform certificate. Fully qualified domains take
/// the `<alias>-cert` secret named by their certificate mapping. Lookup
/// problems leave the domain uncertificated.
async fn resolve_certificates<C: Cluster + ?Sized>(
    cluster: &C,
    service: &Service,
    router: &RouterConfig,
    app: &mut AppConfig,
) {
    for domain in &app.domains {
        if !domain.contains('.') {
            if let Some(platform) = &router.platform_certificate {
                app.certificates.insert(domain.clone(), platform.clone());
            }
            continue;
        }

        let Some(alias) = app.cert_mappings.get(domain) else {
            continue;
        };
        let secret_name = format!("{}-cert", alias);

        match cluster.fetch_secret(&service.namespace, &secret_name).await {
            Ok(Some(data)) => {
                if let Some(certificate) = certificate_from_secret(&data, domain) {
                    app.certificates.insert(domain.clone(), certificate);
                }
            }
            Ok(None) => {
                tracing::warn!(
                    app = %app.name,
                    domain = %domain,
                    secret = %secret_name,
                    "Certificate secret not found, serving domain without TLS"
                );
            }
            Err(e) => {
                tracing::warn!(
                    app = %app.name,
                    domain = %domain,
                    secret = %secret_name,
                    error = %e,
                    "Failed to fetch certificate secret, serving domain without TLS"
                );
            }
        }
    }
}

/// Certificate from a secret's `tls.crt`/`tls.key` entries, if both exist.
pub fn certificate_from_secret(data: &SecretData, context: &str) -> Option<Certificate> {
    let Some(cert) = data.get(CERT_ENTRY) else {
        tracing::warn!(context, entry = CERT_ENTRY, "Certificate secret has no certificate entry");
        return None;
    };
    let Some(key) = data.get(KEY_ENTRY) else {
        tracing::warn!(context, entry = KEY_ENTRY, "Certificate secret has no key entry");
        return None;
    };
    Some(Certificate::new(
        String::from_utf8_lossy(cert),
        String::from_utf8_lossy(key),
    ))
}

/// DH parameters from the dhparam secret; empty when the entry is missing.
pub fn dhparam_from_secret(data: &SecretData) -> String {
    match data.get(DHPARAM_ENTRY) {
        Some(dhparam) => String::from_utf8_lossy(dhparam).into_owned(),
        None => {
            tracing::warn!(entry = DHPARAM_ENTRY, "DH parameter secret has no dhparam entry");
            String::new()
        }
    }
}

pub fn build_builder_config(binder: &Binder, service: &Service) -> BuilderConfig {
    let mut builder = BuilderConfig {
        service_ip: service.cluster_ip.clone(),
        ..BuilderConfig::default()
    };
    binder.bind(&service.annotations, "nginx", &mut builder);
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Annotations;

    fn service(name: &str, namespace: &str, app_label: Option<&str>) -> Service {
        let mut labels = Annotations::new();
        if let Some(label) = app_label {
            labels.insert("app".to_string(), label.to_string());
        }
        Service {
            name: name.to_string(),
            namespace: namespace.to_string(),
            labels,
            ..Service::default()
        }
    }

    #[test]
    fn test_app_name() {
        assert_eq!(app_name(&service("controller", "deis", None)), "deis/controller");
        assert_eq!(app_name(&service("web", "web", None)), "web");
        assert_eq!(app_name(&service("web", "shop", Some("shop"))), "shop");
        assert_eq!(app_name(&service("web-v2", "shop", Some("storefront"))), "shop/storefront");
        assert_eq!(app_name(&service("web", "shop", Some(""))), "shop/web");
    }

    #[test]
    fn test_certificate_from_secret() {
        let mut data = SecretData::new();
        data.insert("tls.crt".to_string(), b"foo".to_vec());
        data.insert("tls.key".to_string(), b"bar".to_vec());
        assert_eq!(certificate_from_secret(&data, "test"), Some(Certificate::new("foo", "bar")));

        data.remove("tls.key");
        assert_eq!(certificate_from_secret(&data, "test"), None);

        let mut other = SecretData::new();
        other.insert("a".to_string(), b"foo".to_vec());
        assert_eq!(certificate_from_secret(&other, "test"), None);
    }

    #[test]
    fn test_dhparam_from_secret() {
        let mut data = SecretData::new();
        data.insert("dhparam".to_string(), b"bizbaz".to_vec());
        assert_eq!(dhparam_from_secret(&data), "bizbaz");

        let mut other = SecretData::new();
        other.insert("foo".to_string(), b"bar".to_vec());
        assert_eq!(dhparam_from_secret(&other), "");
    }

    #[test]
    fn test_builder_config() {
        let mut svc = service("deis-builder", "deis", None);
        svc.cluster_ip = "1.2.3.4".to_string();
        svc.annotations
            .insert("router.deis.io/nginx.connectTimeout".to_string(), "20s".to_string());

        let builder = build_builder_config(&Binder::new("router.deis.io"), &svc);
        assert_eq!(
            builder,
            BuilderConfig {
                connect_timeout: "20s".to_string(),
                tcp_timeout: "1200s".to_string(),
                service_ip: "1.2.3.4".to_string(),
            }
        );
    }
}
