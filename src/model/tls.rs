//! TLS-related configuration.

use serde::Serialize;

use crate::binder::{parse, patterns, Bind, Field, Schema};

/// A certificate and its private key, both PEM-encoded.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    pub cert: String,
    #[serde(skip_serializing)]
    pub key: String,
}

impl Certificate {
    pub fn new(cert: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
        }
    }
}

// Key material stays out of logs.
impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("cert_len", &self.cert.len())
            .field("key", &"<redacted>")
            .finish()
    }
}

/// SSL options shared by the router and individual apps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SslConfig {
    pub enforce: bool,
    pub protocols: String,
    pub ciphers: String,
    pub session_cache: String,
    pub session_timeout: String,
    pub use_session_tickets: bool,
    pub buffer_size: String,
    pub hsts: HstsConfig,
    pub early_data_methods: String,
    /// DH parameters from the dhparam secret; never bound from annotations.
    #[serde(skip_serializing)]
    pub dh_param: String,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            protocols: "TLSv1.2 TLSv1.3".to_string(),
            // Mozilla "intermediate" profile.
            ciphers: [
                "ECDHE-ECDSA-AES128-GCM-SHA256",
                "ECDHE-RSA-AES128-GCM-SHA256",
                "ECDHE-ECDSA-AES256-GCM-SHA384",
                "ECDHE-RSA-AES256-GCM-SHA384",
                "ECDHE-ECDSA-CHACHA20-POLY1305",
                "ECDHE-RSA-CHACHA20-POLY1305",
                "DHE-RSA-AES128-GCM-SHA256",
                "DHE-RSA-AES256-GCM-SHA384",
            ]
            .join(":"),
            session_cache: String::new(),
            session_timeout: "10m".to_string(),
            use_session_tickets: true,
            buffer_size: "4k".to_string(),
            hsts: HstsConfig::default(),
            early_data_methods: "GET|HEAD|OPTIONS".to_string(),
            dh_param: String::new(),
        }
    }
}

impl Schema for SslConfig {
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "enforce",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.enforce, v),
        },
        Field {
            key: "protocols",
            pattern: Some(patterns::SSL_PROTOCOLS),
            set: |c, v| parse::string(&mut c.protocols, v),
        },
        Field {
            key: "ciphers",
            pattern: Some(patterns::SSL_CIPHERS),
            set: |c, v| parse::string(&mut c.ciphers, v),
        },
        Field {
            key: "sessionCache",
            pattern: Some(patterns::SSL_SESSION_CACHE),
            set: |c, v| parse::string(&mut c.session_cache, v),
        },
        Field {
            key: "sessionTimeout",
            pattern: Some(patterns::DURATION),
            set: |c, v| parse::string(&mut c.session_timeout, v),
        },
        Field {
            key: "useSessionTickets",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.use_session_tickets, v),
        },
        Field {
            key: "bufferSize",
            pattern: Some(patterns::SIZE),
            set: |c, v| parse::string(&mut c.buffer_size, v),
        },
        Field {
            key: "earlyDataMethods",
            pattern: Some(patterns::EARLY_DATA_METHODS),
            set: |c, v| parse::string(&mut c.early_data_methods, v),
        },
    ];

    fn nested(&mut self) -> Vec<(&'static str, &mut dyn Bind)> {
        vec![("hsts", &mut self.hsts as &mut dyn Bind)]
    }
}

/// HTTP Strict Transport Security options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HstsConfig {
    pub enabled: bool,
    pub max_age: u64,
    pub include_sub_domains: bool,
    pub preload: bool,
}

impl Default for HstsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_age: 15_552_000, // 180 days
            include_sub_domains: false,
            preload: false,
        }
    }
}

impl Schema for HstsConfig {
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "enabled",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.enabled, v),
        },
        Field {
            key: "maxAge",
            pattern: Some(patterns::POSITIVE_INT),
            set: |c, v| parse::number(&mut c.max_age, v),
        },
        Field {
            key: "includeSubDomains",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.include_sub_domains, v),
        },
        Field {
            key: "preload",
            pattern: Some(patterns::BOOLEAN),
            set: |c, v| parse::boolean(&mut c.preload, v),
        },
    ];
}
