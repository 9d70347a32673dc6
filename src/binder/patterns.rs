//! Validating patterns for annotation values.

pub const BOOLEAN: &str = r"(?i)^(true|false)$";
pub const POSITIVE_INT: &str = r"^[1-9]\d*$";
pub const WORKER_PROCESSES: &str = r"^(auto|[1-9]\d*)$";
pub const SIZE: &str = r"^[1-9]\d*[kKmM]?$";
pub const SIZE_OR_ZERO: &str = r"^[0-9]\d*[kKmM]?$";
pub const DURATION: &str = r"^[1-9]\d*(ms|[smhdwMy])?$";
pub const ERROR_LOG_LEVEL: &str = r"^(debug|info|notice|warn|error|crit|alert|emerg)$";
pub const WHITELIST_MODE: &str = r"^(extend|override)$";
pub const REFERRER_POLICY: &str = r"^(no-referrer|no-referrer-when-downgrade|origin|origin-when-cross-origin|same-origin|strict-origin|strict-origin-when-cross-origin|unsafe-url|none)$";

pub const CIDR_LIST: &str = r"^((([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])(\/([0-9]|[1-2][0-9]|3[0-2]))?(\s*,\s*)?)+$";

pub const FQDN: &str = r"(?i)^([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z0-9]+(-*[a-z0-9]+)+$";
pub const DOMAIN_LIST: &str = r"(?i)^((([a-z0-9]+(-*[a-z0-9]+)*)|((\*\.)?[a-z0-9]+(-*[a-z0-9]+)*\.)+[a-z0-9]+(-*[a-z0-9]+)+)(\s*,\s*)?)+$";
pub const CERT_MAPPINGS: &str = r"(?i)^((([a-z0-9]+(-*[a-z0-9]+)*)|((\*\.)?[a-z0-9]+(-*[a-z0-9]+)*\.)+[a-z0-9]+(-*[a-z0-9]+)+):([a-z0-9]+(-*[a-z0-9]+)*)(\s*,\s*)?)+$";

pub const GZIP_COMP_LEVEL: &str = r"^[1-9]$";
pub const GZIP_HTTP_VERSION: &str = r"^(1\.0|1\.1)$";
pub const GZIP_MIN_LENGTH: &str = r"^\d+$";
pub const GZIP_PROXIED: &str = r"^((off|expired|no-cache|no-store|private|no_last_modified|no_etag|auth|any)\s*)+$";
pub const GZIP_TYPES: &str = r"(?i)^([a-z\d]+/[a-z\d][a-z\d+\-\.]*[a-z\d]\s*)+$";
pub const ON_OFF: &str = r"^(on|off)$";

pub const SSL_PROTOCOLS: &str = r"^((SSLv[2-3]|TLSv1(?:\.[1-3])?)\s*)+$";
pub const SSL_CIPHERS: &str = r"^((\b[\w.!+-]+\b)+(:?@(STRENGTH|SECLEVEL=[0-5]))?(:([!+-]\b)?|$))*(((\b[\w.+-]+\b)+|(\[(\b[\w.|+-]+\b)+\]))(:|$))*$";
pub const SSL_SESSION_CACHE: &str = r"^(off|none|((builtin(:[1-9]\d*)?|shared:\w+:[1-9]\d*[kKmM]?)\s*){1,2})$";
pub const EARLY_DATA_METHODS: &str = r"^((GET|HEAD|POST|PUT|DELETE|PATCH|OPTIONS)(\|\b|$))*$";

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    const ALL: &[&str] = &[
        BOOLEAN, POSITIVE_INT, WORKER_PROCESSES, SIZE, SIZE_OR_ZERO, DURATION,
        ERROR_LOG_LEVEL, WHITELIST_MODE, REFERRER_POLICY, CIDR_LIST, FQDN,
        DOMAIN_LIST, CERT_MAPPINGS, GZIP_COMP_LEVEL, GZIP_HTTP_VERSION,
        GZIP_MIN_LENGTH, GZIP_PROXIED, GZIP_TYPES, ON_OFF, SSL_PROTOCOLS,
        SSL_CIPHERS, SSL_SESSION_CACHE, EARLY_DATA_METHODS,
    ];

    fn is_match(pattern: &str, value: &str) -> bool {
        Regex::new(pattern).unwrap().is_match(value)
    }

    #[test]
    fn test_all_patterns_compile() {
        for pattern in ALL {
            assert!(Regex::new(pattern).is_ok(), "pattern failed to compile: {}", pattern);
        }
    }

    #[test]
    fn test_duration() {
        assert!(is_match(DURATION, "1500s"));
        assert!(is_match(DURATION, "250ms"));
        assert!(is_match(DURATION, "30"));
        assert!(!is_match(DURATION, "0s"));
        assert!(!is_match(DURATION, "fast"));
    }

    #[test]
    fn test_domain_list() {
        assert!(is_match(DOMAIN_LIST, "foo"));
        assert!(is_match(DOMAIN_LIST, "foo.example.com, bar"));
        assert!(is_match(DOMAIN_LIST, "*.example.com"));
        assert!(!is_match(DOMAIN_LIST, "foo_bar"));
    }

    #[test]
    fn test_cidr_list() {
        assert!(is_match(CIDR_LIST, "10.0.0.0/8"));
        assert!(is_match(CIDR_LIST, "10.0.0.0/8, 192.168.1.1"));
        assert!(!is_match(CIDR_LIST, "10.0.0.0/33"));
        assert!(!is_match(CIDR_LIST, "256.0.0.1"));
    }

    #[test]
    fn test_cert_mappings() {
        assert!(is_match(CERT_MAPPINGS, "foo.example.com:foo"));
        assert!(is_match(CERT_MAPPINGS, "foo.example.com:foo, bar.example.com:bar-cert"));
        assert!(!is_match(CERT_MAPPINGS, "foo.example.com"));
    }

    #[test]
    fn test_ssl_values() {
        assert!(is_match(SSL_PROTOCOLS, "TLSv1.2 TLSv1.3"));
        assert!(!is_match(SSL_PROTOCOLS, "TLSv2"));
        assert!(is_match(SSL_SESSION_CACHE, "shared:SSL:10m"));
        assert!(is_match(EARLY_DATA_METHODS, "GET|HEAD|OPTIONS"));
        assert!(is_match(SSL_CIPHERS, "ECDHE-RSA-AES128-GCM-SHA256:ECDHE-RSA-AES256-GCM-SHA384"));
    }
}
