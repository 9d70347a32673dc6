//! Per-app and builder configuration.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::binder::{parse, patterns, Bind, Field, Schema};
use crate::model::router::{ProxyBuffersConfig, RouterConfig};
use crate::model::tls::{Certificate, SslConfig};

/// Routing configuration for one backend service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub name: String,
    pub domains: Vec<String>,
    pub regex_domain: String,
    pub whitelist: Vec<String>,
    pub connect_timeout: String,
    pub tcp_timeout: String,
    pub service_ip: String,
    /// Domain → certificate alias, as declared on the service.
    pub cert_mappings: BTreeMap<String, String>,
    /// Domain → resolved certificate. Domains without one are absent.
    pub certificates: BTreeMap<String, Certificate>,
    pub available: bool,
    pub maintenance: bool,
    pub disable_request_start_header: bool,
    pub referrer_policy: String,
    pub ssl: SslConfig,
    pub nginx: NginxAppConfig,
    pub proxy_locations: Vec<String>,
    pub proxy_domain: String,
    pub locations: Vec<Location>,
}

impl AppConfig {
    /// Defaults for an app, some of which are inherited from the router.
    pub fn new(router: &RouterConfig) -> Self {
        Self {
            name: String::new(),
            domains: Vec::new(),
            regex_domain: String::new(),
            whitelist: Vec::new(),
            connect_timeout: "30s".to_string(),
            tcp_timeout: router.default_timeout.clone(),
            service_ip: String::new(),
            cert_mappings: BTreeMap::new(),
            certificates: BTreeMap::new(),
            available: false,
            maintenance: false,
            disable_request_start_header: false,
            referrer_policy: String::new(),
            ssl: SslConfig::default(),
            nginx: NginxAppConfig {
                proxy_buffers: router.proxy_buffers.clone(),
            },
            proxy_locations: Vec::new(),
            proxy_domain: String::new(),
            locations: Vec::new(),
        }
    }

    /// Whether this app borrows paths on another app's vhost.
    pub fn proxies_elsewhere(&self) -> bool {
        !self.proxy_domain.is_empty() && !self.proxy_locations.is_empty()
    }
}

impl Schema for AppConfig {
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "domains",
            pattern: Some(patterns::DOMAIN_LIST),
            set: |c, v| parse::list(&mut c.domains, v),
        },
        Field {
            key: "regexDomain",
            pattern: None,
            set: |c, v| parse::string(&mut c.regex_domain, v),
        },
        Field {
            key: "whitelist",
            pattern: Some(patterns::CIDR_LIST),
            set: |c, v| parse::list(&mut c.whitelist, v),
        },
        Field {
            key: "connectTimeout",
            pattern: Some(patterns::DURATION),
            set: |c, v| parse::string(&mut c.connect_timeout, v),
        },
        Field {
            key: "tcpTimeout",
            pattern: Some(patterns::DURATION),
            set: |c, v| parse::string(&mut c.tcp_timeout, v),
        },
        Field {
            key: "certificates",
            pattern: Some(patterns::CERT_MAPPINGS),
            set: |c, v| parse::map(&mut c.cert_mappings, v),
        },
        Field {
            key: "maintenance",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.maintenance, v),
        },
        Field {
            key: "disableRequestStartHeader",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.disable_request_start_header, v),
        },
        Field {
            key: "referrerPolicy",
            pattern: Some(patterns::REFERRER_POLICY),
            set: |c, v| parse::string(&mut c.referrer_policy, v),
        },
        Field {
            key: "proxyLocations",
            pattern: None,
            set: |c, v| parse::list(&mut c.proxy_locations, v),
        },
        Field {
            key: "proxyDomain",
            pattern: None,
            set: |c, v| parse::string(&mut c.proxy_domain, v),
        },
    ];

    fn nested(&mut self) -> Vec<(&'static str, &mut dyn Bind)> {
        vec![
            ("ssl", &mut self.ssl as &mut dyn Bind),
            ("nginx", &mut self.nginx as &mut dyn Bind),
        ]
    }
}

/// A URL path on an app's vhost, served by the `owner` app's backend.
///
/// `owner` is the declaring app's index in `RouterConfig::app_configs`;
/// app names are not unique, indices are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub owner: usize,
    pub path: String,
}

impl Location {
    pub fn new(owner: usize, path: impl Into<String>) -> Self {
        Self {
            owner,
            path: path.into(),
        }
    }
}

/// Nginx-specific per-app options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NginxAppConfig {
    pub proxy_buffers: ProxyBuffersConfig,
}

impl Schema for NginxAppConfig {
    const FIELDS: &'static [Field<Self>] = &[];

    fn nested(&mut self) -> Vec<(&'static str, &mut dyn Bind)> {
        vec![("proxyBuffers", &mut self.proxy_buffers as &mut dyn Bind)]
    }
}

/// The git builder backend, reachable on a fixed TCP port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConfig {
    pub connect_timeout: String,
    pub tcp_timeout: String,
    pub service_ip: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            connect_timeout: "10s".to_string(),
            tcp_timeout: "1200s".to_string(),
            service_ip: String::new(),
        }
    }
}

impl Schema for BuilderConfig {
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "connectTimeout",
            pattern: Some(patterns::DURATION),
            set: |c, v| parse::string(&mut c.connect_timeout, v),
        },
        Field {
            key: "tcpTimeout",
            pattern: Some(patterns::DURATION),
            set: |c, v| parse::string(&mut c.tcp_timeout, v),
        },
    ];
}
