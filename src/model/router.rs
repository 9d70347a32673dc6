//! Router-wide configuration.

use serde::Serialize;

use crate::binder::{parse, patterns, Bind, Field, Schema};
use crate::model::app::{AppConfig, BuilderConfig, Location};
use crate::model::tls::{Certificate, SslConfig};

const DEFAULT_LOG_FORMAT: &str = concat!(
    "[$time_iso8601] - $app_name - $remote_addr - $remote_user - $status - \"$request\" - ",
    "$bytes_sent - \"$http_referer\" - \"$http_user_agent\" - \"$server_name\" - ",
    "$upstream_addr - $http_host - $upstream_response_time - $request_time",
);

/// Root of a configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    pub worker_processes: String,
    pub max_worker_connections: String,
    pub traffic_status_zone_size: String,
    pub default_timeout: String,
    pub server_name_hash_max_size: String,
    pub server_name_hash_bucket_size: String,
    pub gzip: GzipConfig,
    pub body_size: String,
    pub large_header_buffers_count: String,
    pub large_header_buffers_size: String,
    pub proxy_real_ip_cidrs: Vec<String>,
    pub error_log_level: String,
    pub platform_domain: String,
    pub use_proxy_protocol: bool,
    pub disable_server_tokens: bool,
    pub enforce_whitelists: bool,
    pub default_whitelist: Vec<String>,
    pub whitelist_mode: String,
    pub enable_regex_domains: bool,
    pub load_modsecurity_module: bool,
    pub default_service_ip: String,
    pub default_app_name: String,
    pub default_service_enabled: bool,
    pub request_ids: bool,
    pub request_start_header: bool,
    pub ssl: SslConfig,
    pub http2_enabled: bool,
    pub log_format: String,
    pub proxy_buffers: ProxyBuffersConfig,
    pub referrer_policy: String,
    pub app_configs: Vec<AppConfig>,
    pub builder_config: Option<BuilderConfig>,
    pub platform_certificate: Option<Certificate>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            worker_processes: "auto".to_string(),
            max_worker_connections: "768".to_string(),
            traffic_status_zone_size: "1m".to_string(),
            default_timeout: "1300s".to_string(),
            server_name_hash_max_size: "512".to_string(),
            server_name_hash_bucket_size: "64".to_string(),
            gzip: GzipConfig::default(),
            body_size: "1m".to_string(),
            large_header_buffers_count: "4".to_string(),
            large_header_buffers_size: "32k".to_string(),
            proxy_real_ip_cidrs: vec!["10.0.0.0/8".to_string()],
            error_log_level: "error".to_string(),
            platform_domain: String::new(),
            use_proxy_protocol: false,
            disable_server_tokens: false,
            enforce_whitelists: false,
            default_whitelist: Vec::new(),
            whitelist_mode: "extend".to_string(),
            enable_regex_domains: false,
            load_modsecurity_module: false,
            default_service_ip: String::new(),
            default_app_name: String::new(),
            default_service_enabled: false,
            request_ids: false,
            request_start_header: false,
            ssl: SslConfig::default(),
            http2_enabled: true,
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            proxy_buffers: ProxyBuffersConfig::default(),
            referrer_policy: String::new(),
            app_configs: Vec::new(),
            builder_config: None,
            platform_certificate: None,
        }
    }
}

impl RouterConfig {
    /// Look up an app by name. Names can repeat; this returns the first.
    pub fn app(&self, name: &str) -> Option<&AppConfig> {
        self.app_configs.iter().find(|app| app.name == name)
    }

    /// The app whose backend serves `location`.
    pub fn owner_of(&self, location: &Location) -> Option<&AppConfig> {
        self.app_configs.get(location.owner)
    }
}

impl Schema for RouterConfig {
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "workerProcesses",
            pattern: Some(patterns::WORKER_PROCESSES),
            set: |c, v| parse::string(&mut c.worker_processes, v),
        },
        Field {
            key: "maxWorkerConnections",
            pattern: Some(patterns::POSITIVE_INT),
            set: |c, v| parse::string(&mut c.max_worker_connections, v),
        },
        Field {
            key: "trafficStatusZoneSize",
            pattern: Some(patterns::SIZE),
            set: |c, v| parse::string(&mut c.traffic_status_zone_size, v),
        },
        Field {
            key: "defaultTimeout",
            pattern: Some(patterns::DURATION),
            set: |c, v| parse::string(&mut c.default_timeout, v),
        },
        Field {
            key: "serverNameHashMaxSize",
            pattern: Some(patterns::SIZE),
            set: |c, v| parse::string(&mut c.server_name_hash_max_size, v),
        },
        Field {
            key: "serverNameHashBucketSize",
            pattern: Some(patterns::SIZE),
            set: |c, v| parse::string(&mut c.server_name_hash_bucket_size, v),
        },
        Field {
            key: "bodySize",
            pattern: Some(patterns::SIZE_OR_ZERO),
            set: |c, v| parse::string(&mut c.body_size, v),
        },
        Field {
            key: "largeHeaderBuffersCount",
            pattern: Some(patterns::POSITIVE_INT),
            set: |c, v| parse::string(&mut c.large_header_buffers_count, v),
        },
        Field {
            key: "largeHeaderBuffersSize",
            pattern: Some(patterns::SIZE_OR_ZERO),
            set: |c, v| parse::string(&mut c.large_header_buffers_size, v),
        },
        Field {
            key: "proxyRealIpCidrs",
            pattern: Some(patterns::CIDR_LIST),
            set: |c, v| parse::list(&mut c.proxy_real_ip_cidrs, v),
        },
        Field {
            key: "errorLogLevel",
            pattern: Some(patterns::ERROR_LOG_LEVEL),
            set: |c, v| parse::string(&mut c.error_log_level, v),
        },
        Field {
            key: "platformDomain",
            pattern: Some(patterns::FQDN),
            set: |c, v| parse::string(&mut c.platform_domain, v),
        },
        Field {
            key: "useProxyProtocol",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.use_proxy_protocol, v),
        },
        Field {
            key: "disableServerTokens",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.disable_server_tokens, v),
        },
        Field {
            key: "enforceWhitelists",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.enforce_whitelists, v),
        },
        Field {
            key: "defaultWhitelist",
            pattern: Some(patterns::CIDR_LIST),
            set: |c, v| parse::list(&mut c.default_whitelist, v),
        },
        Field {
            key: "whitelistMode",
            pattern: Some(patterns::WHITELIST_MODE),
            set: |c, v| parse::string(&mut c.whitelist_mode, v),
        },
        Field {
            key: "enableRegexDomains",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.enable_regex_domains, v),
        },
        Field {
            key: "loadModsecurityModule",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.load_modsecurity_module, v),
        },
        Field {
            key: "defaultServiceIP",
            pattern: None,
            set: |c, v| parse::string(&mut c.default_service_ip, v),
        },
        Field {
            key: "defaultAppName",
            pattern: None,
            set: |c, v| parse::string(&mut c.default_app_name, v),
        },
        Field {
            key: "defaultServiceEnabled",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.default_service_enabled, v),
        },
        Field {
            key: "requestIDs",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.request_ids, v),
        },
        Field {
            key: "requestStartHeader",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.request_start_header, v),
        },
        Field {
            key: "http2Enabled",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.http2_enabled, v),
        },
        Field {
            key: "logFormat",
            pattern: None,
            set: |c, v| parse::string(&mut c.log_format, v),
        },
        Field {
            key: "referrerPolicy",
            pattern: Some(patterns::REFERRER_POLICY),
            set: |c, v| parse::string(&mut c.referrer_policy, v),
        },
    ];

    fn nested(&mut self) -> Vec<(&'static str, &mut dyn Bind)> {
        vec![
            ("gzip", &mut self.gzip as &mut dyn Bind),
            ("ssl", &mut self.ssl as &mut dyn Bind),
            ("proxyBuffers", &mut self.proxy_buffers as &mut dyn Bind),
        ]
    }
}

/// Response compression options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GzipConfig {
    pub enabled: bool,
    pub comp_level: String,
    pub disable: String,
    pub http_version: String,
    pub min_length: String,
    pub proxied: String,
    pub types: String,
    pub vary: String,
}

impl Default for GzipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            comp_level: "5".to_string(),
            disable: "msie6".to_string(),
            http_version: "1.1".to_string(),
            min_length: "256".to_string(),
            proxied: "any".to_string(),
            types: [
                "application/atom+xml",
                "application/javascript",
                "application/json",
                "application/rss+xml",
                "application/vnd.ms-fontobject",
                "application/x-font-ttf",
                "application/x-web-app-manifest+json",
                "application/xhtml+xml",
                "application/xml",
                "font/opentype",
                "image/svg+xml",
                "image/x-icon",
                "text/css",
                "text/plain",
                "text/x-component",
            ]
            .join(" "),
            vary: "on".to_string(),
        }
    }
}

impl Schema for GzipConfig {
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "enabled",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.enabled, v),
        },
        Field {
            key: "compLevel",
            pattern: Some(patterns::GZIP_COMP_LEVEL),
            set: |c, v| parse::string(&mut c.comp_level, v),
        },
        Field {
            key: "disable",
            pattern: None,
            set: |c, v| parse::string(&mut c.disable, v),
        },
        Field {
            key: "httpVersion",
            pattern: Some(patterns::GZIP_HTTP_VERSION),
            set: |c, v| parse::string(&mut c.http_version, v),
        },
        Field {
            key: "minLength",
            pattern: Some(patterns::GZIP_MIN_LENGTH),
            set: |c, v| parse::string(&mut c.min_length, v),
        },
        Field {
            key: "proxied",
            pattern: Some(patterns::GZIP_PROXIED),
            set: |c, v| parse::string(&mut c.proxied, v),
        },
        Field {
            key: "types",
            pattern: Some(patterns::GZIP_TYPES),
            set: |c, v| parse::string(&mut c.types, v),
        },
        Field {
            key: "vary",
            pattern: Some(patterns::ON_OFF),
            set: |c, v| parse::string(&mut c.vary, v),
        },
    ];
}

/// Proxy buffering options, router-wide or per app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyBuffersConfig {
    pub enabled: bool,
    pub number: u32,
    pub size: String,
    pub busy_size: String,
}

impl Default for ProxyBuffersConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            number: 8,
            size: "4k".to_string(),
            busy_size: "8k".to_string(),
        }
    }
}

impl Schema for ProxyBuffersConfig {
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "enabled",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.enabled, v),
        },
        Field {
            key: "number",
            pattern: Some(patterns::POSITIVE_INT),
            set: |c, v| parse::number(&mut c.number, v),
        },
        Field {
            key: "size",
            pattern: Some(patterns::SIZE),
            set: |c, v| parse::string(&mut c.size, v),
        },
        Field {
            key: "busySize",
            pattern: Some(patterns::SIZE),
            set: |c, v| parse::string(&mut c.busy_size, v),
        },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{Annotations, Binder};

    fn bind(pairs: &[(&str, &str)]) -> RouterConfig {
        let binder = Binder::new("router.deis.io");
        let annotations: Annotations = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = RouterConfig::default();
        binder.bind(&annotations, "nginx", &mut config);
        config
    }

    #[test]
    fn test_default_timeout_override_leaves_other_defaults() {
        let config = bind(&[("router.deis.io/nginx.defaultTimeout", "1500s")]);

        assert_eq!(config.default_timeout, "1500s");
        assert_eq!(config.max_worker_connections, "768");
        assert_eq!(config.gzip, GzipConfig::default());
        assert_eq!(config.ssl, SslConfig::default());
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = bind(&[
            ("router.deis.io/nginx.workerProcesses", "many"),
            ("router.deis.io/nginx.errorLogLevel", "loud"),
            ("router.deis.io/nginx.proxyRealIpCidrs", "not-a-cidr"),
            ("router.deis.io/nginx.gzip.compLevel", "12"),
            ("router.deis.io/nginx.proxyBuffers.number", "0"),
        ]);

        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_lists_and_nested_scopes() {
        let config = bind(&[
            ("router.deis.io/nginx.proxyRealIpCidrs", "10.0.0.0/8, 172.16.0.0/12"),
            ("router.deis.io/nginx.gzip.enabled", "False"),
            ("router.deis.io/nginx.proxyBuffers.enabled", "true"),
            ("router.deis.io/nginx.proxyBuffers.size", "16k"),
        ]);

        assert_eq!(config.proxy_real_ip_cidrs, vec!["10.0.0.0/8", "172.16.0.0/12"]);
        assert!(!config.gzip.enabled);
        assert!(config.proxy_buffers.enabled);
        assert_eq!(config.proxy_buffers.size, "16k");
        assert_eq!(config.proxy_buffers.number, 8);
    }
}
