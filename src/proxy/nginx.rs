//! nginx.conf rendering.
//!
//! Layout of the rendered file:
//! ```text
//! globals, events
//! http {
//!     tuning, gzip, real-ip, logging, scheme/port maps, HSTS map
//!     default server (404 or default service) on 8080/6443
//!     healthz server on 9090
//!     one server per app domain
//! }
//! stream { builder on 2222 }   (only with a builder)
//! ```

use std::fmt::Write;
use std::path::PathBuf;

use crate::materialize::{DHPARAM_FILE, PLATFORM_CERT_NAME};
use crate::model::{AppConfig, Location, ProxyBuffersConfig, RouterConfig, SslConfig};
use crate::proxy::{RenderError, Renderer};

const HTTP_PORT: u16 = 8080;
const HTTPS_PORT: u16 = 6443;
const HEALTHZ_PORT: u16 = 9090;
const BUILDER_PORT: u16 = 2222;

type RenderResult = Result<(), RenderError>;

/// Renders snapshots as nginx configuration referencing certificates in `ssl_dir`.
#[derive(Debug, Clone)]
pub struct NginxRenderer {
    ssl_dir: PathBuf,
}

impl NginxRenderer {
    pub fn new(ssl_dir: impl Into<PathBuf>) -> Self {
        Self {
            ssl_dir: ssl_dir.into(),
        }
    }

    fn ssl_path(&self, file: &str) -> String {
        self.ssl_dir.join(file).display().to_string()
    }
}

impl Renderer for NginxRenderer {
    fn render(&self, config: &RouterConfig) -> Result<String, RenderError> {
        let mut out = String::new();
        render_globals(&mut out, config)?;

        out.push_str("http {\n");
        render_http_settings(&mut out, config)?;
        render_maps(&mut out, config)?;
        if config.default_service_enabled {
            render_default_service(&mut out, config)?;
        } else {
            self.render_default_server(&mut out, config)?;
        }
        render_healthz(&mut out)?;
        for app in &config.app_configs {
            for domain in &app.domains {
                self.render_app_server(&mut out, config, app, domain)?;
            }
        }
        out.push_str("}\n");

        render_stream(&mut out, config)?;
        Ok(out)
    }
}

impl NginxRenderer {
    fn render_default_server(&self, out: &mut String, config: &RouterConfig) -> RenderResult {
        let proxy_protocol = flag(config.use_proxy_protocol, " proxy_protocol");
        writeln!(out, "    server {{")?;
        writeln!(out, "        listen {} default_server reuseport{};", HTTP_PORT, proxy_protocol)?;
        writeln!(
            out,
            "        listen {} default_server ssl{}{};",
            HTTPS_PORT,
            flag(config.http2_enabled, " http2"),
            proxy_protocol
        )?;
        writeln!(out, "        server_name _;")?;
        writeln!(out, "        set $app_name \"router-default-vhost\";")?;

        let (cert, key) = if config.platform_certificate.is_some() {
            (
                self.ssl_path(&format!("{}.crt", PLATFORM_CERT_NAME)),
                self.ssl_path(&format!("{}.key", PLATFORM_CERT_NAME)),
            )
        } else {
            (self.ssl_path("default/default.crt"), self.ssl_path("default/default.key"))
        };
        self.render_tls(out, &config.ssl, &cert, &key)?;

        if !config.referrer_policy.is_empty() {
            writeln!(out, "        add_header Referrer-Policy {};", config.referrer_policy)?;
        }
        render_healthz_location(out)?;
        writeln!(out, "        location / {{")?;
        writeln!(out, "            return 404;")?;
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;
        Ok(())
    }

    fn render_tls(&self, out: &mut String, ssl: &SslConfig, cert: &str, key: &str) -> RenderResult {
        writeln!(out, "        ssl_protocols {};", ssl.protocols)?;
        if !ssl.ciphers.is_empty() {
            writeln!(out, "        ssl_ciphers {};", ssl.ciphers)?;
        }
        writeln!(out, "        ssl_prefer_server_ciphers on;")?;
        writeln!(out, "        ssl_early_data {};", on_off(!ssl.early_data_methods.is_empty()))?;
        writeln!(out, "        ssl_certificate {};", cert)?;
        writeln!(out, "        ssl_certificate_key {};", key)?;
        if !ssl.session_cache.is_empty() {
            writeln!(out, "        ssl_session_cache {};", ssl.session_cache)?;
            writeln!(out, "        ssl_session_timeout {};", ssl.session_timeout)?;
        }
        writeln!(out, "        ssl_session_tickets {};", on_off(ssl.use_session_tickets))?;
        writeln!(out, "        ssl_buffer_size {};", ssl.buffer_size)?;
        if !ssl.dh_param.is_empty() {
            writeln!(out, "        ssl_dhparam {};", self.ssl_path(DHPARAM_FILE))?;
        }
        Ok(())
    }

    fn render_app_server(
        &self,
        out: &mut String,
        config: &RouterConfig,
        app: &AppConfig,
        domain: &str,
    ) -> RenderResult {
        writeln!(out, "    server {{")?;
        let proxy_protocol = flag(config.use_proxy_protocol, " proxy_protocol");
        writeln!(out, "        listen {}{};", HTTP_PORT, proxy_protocol)?;
        writeln!(out, "        server_name {};", server_name(config, app, domain))?;
        writeln!(out, "        server_name_in_redirect off;")?;
        writeln!(out, "        port_in_redirect off;")?;
        writeln!(out, "        set $app_name \"{}\";", app.name)?;

        if config.load_modsecurity_module {
            writeln!(out, "        modsecurity on;")?;
            writeln!(out, "        modsecurity_rules_file /opt/router/conf/modsecurity.conf;")?;
        }

        if app.certificates.contains_key(domain) {
            writeln!(
                out,
                "        listen {} ssl{}{};",
                HTTPS_PORT,
                flag(config.http2_enabled, " http2"),
                flag(config.use_proxy_protocol, " proxy_protocol")
            )?;
            let cert = self.ssl_path(&format!("{}.crt", domain));
            let key = self.ssl_path(&format!("{}.key", domain));
            self.render_tls(out, &config.ssl, &cert, &key)?;
        }

        render_whitelist(out, config, app)?;
        writeln!(
            out,
            "        vhost_traffic_status_filter_by_set_key {} application::*;",
            app.name
        )?;

        if !config.ssl.early_data_methods.is_empty() {
            writeln!(out, "        if ($ssl_block_early_data) {{")?;
            writeln!(out, "            return 425;")?;
            writeln!(out, "        }}")?;
        }

        for location in &app.locations {
            render_location(out, config, app, location)?;
        }

        if app.maintenance {
            writeln!(out, "        error_page 503 @maintenance;")?;
            writeln!(out, "        location @maintenance {{")?;
            writeln!(out, "            root /;")?;
            writeln!(out, "            rewrite ^(.*)$ /www/maintenance.html break;")?;
            writeln!(out, "        }}")?;
        }
        writeln!(out, "    }}")?;
        Ok(())
    }
}

fn render_globals(out: &mut String, config: &RouterConfig) -> RenderResult {
    writeln!(out, "daemon off;")?;
    writeln!(out, "pid /tmp/nginx.pid;")?;
    writeln!(out, "worker_processes {};", config.worker_processes)?;
    if config.load_modsecurity_module {
        writeln!(out, "load_module modules/ngx_http_modsecurity_module.so;")?;
    }
    writeln!(out)?;
    writeln!(out, "events {{")?;
    writeln!(out, "    worker_connections {};", config.max_worker_connections)?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    Ok(())
}

fn render_http_settings(out: &mut String, config: &RouterConfig) -> RenderResult {
    writeln!(out, "    sendfile on;")?;
    writeln!(out, "    tcp_nopush on;")?;
    writeln!(out, "    tcp_nodelay on;")?;
    writeln!(
        out,
        "    vhost_traffic_status_zone shared:vhost_traffic_status:{};",
        config.traffic_status_zone_size
    )?;
    writeln!(out, "    keepalive_timeout {};", config.default_timeout)?;
    writeln!(out, "    types_hash_max_size 2048;")?;
    writeln!(out, "    server_names_hash_max_size {};", config.server_name_hash_max_size)?;
    writeln!(out, "    server_names_hash_bucket_size {};", config.server_name_hash_bucket_size)?;

    let gzip = &config.gzip;
    if gzip.enabled {
        writeln!(out, "    gzip on;")?;
        writeln!(out, "    gzip_comp_level {};", gzip.comp_level)?;
        writeln!(out, "    gzip_disable {};", gzip.disable)?;
        writeln!(out, "    gzip_http_version {};", gzip.http_version)?;
        writeln!(out, "    gzip_min_length {};", gzip.min_length)?;
        writeln!(out, "    gzip_types {};", gzip.types)?;
        writeln!(out, "    gzip_proxied {};", gzip.proxied)?;
        writeln!(out, "    gzip_vary {};", gzip.vary)?;
    }

    writeln!(out, "    client_max_body_size {};", config.body_size)?;
    writeln!(
        out,
        "    large_client_header_buffers {} {};",
        config.large_header_buffers_count, config.large_header_buffers_size
    )?;
    if config.disable_server_tokens {
        writeln!(out, "    server_tokens off;")?;
    }

    for cidr in &config.proxy_real_ip_cidrs {
        writeln!(out, "    set_real_ip_from {};", cidr)?;
    }
    writeln!(out, "    real_ip_recursive on;")?;
    if config.use_proxy_protocol {
        writeln!(out, "    real_ip_header proxy_protocol;")?;
    } else {
        writeln!(out, "    real_ip_header X-Forwarded-For;")?;
    }

    writeln!(out, "    log_format upstreaminfo '{}';", config.log_format)?;
    writeln!(out, "    access_log /tmp/logpipe upstreaminfo;")?;
    writeln!(out, "    error_log /tmp/logpipe {};", config.error_log_level)?;
    writeln!(out)?;
    Ok(())
}

fn render_maps(out: &mut String, config: &RouterConfig) -> RenderResult {
    out.push_str(concat!(
        "    map $http_upgrade $connection_upgrade {\n",
        "        default upgrade;\n",
        "        '' close;\n",
        "    }\n",
        "    map $http_x_forwarded_proto $tmp_access_scheme {\n",
        "        default $scheme;\n",
        "        \"~^(.*, ?)?http$\" \"http\";\n",
        "        \"~^(.*, ?)?https$\" \"https\";\n",
        "        \"~^(.*, ?)?ws$\" \"ws\";\n",
        "        \"~^(.*, ?)?wss$\" \"wss\";\n",
        "    }\n",
        "    map $scheme $access_scheme {\n",
        "        default $tmp_access_scheme;\n",
        "        \"https\" \"https\";\n",
        "        \"wss\" \"wss\";\n",
        "    }\n",
        "    map $server_port $standard_server_port {\n",
        "        default $server_port;\n",
        "        8080 80;\n",
        "        6443 443;\n",
        "    }\n",
        "    map $http_x_forwarded_port $forwarded_port {\n",
        "        default $http_x_forwarded_port;\n",
        "        '' $standard_server_port;\n",
        "    }\n",
        "    map $access_scheme $uri_scheme {\n",
        "        default \"https\";\n",
        "        \"ws\" \"wss\";\n",
        "    }\n",
    ));

    let hsts = &config.ssl.hsts;
    if hsts.enabled {
        writeln!(out, "    map $access_scheme $sts {{")?;
        writeln!(
            out,
            "        'https' 'max-age={}{}{}';",
            hsts.max_age,
            flag(hsts.include_sub_domains, "; includeSubDomains"),
            flag(hsts.preload, "; preload")
        )?;
        writeln!(out, "    }}")?;
    }

    if !config.ssl.early_data_methods.is_empty() {
        writeln!(out, "    map $request_method $ssl_block_early_data {{")?;
        writeln!(out, "        default $ssl_early_data;")?;
        writeln!(out, "        \"~^{}$\" 0;", config.ssl.early_data_methods)?;
        writeln!(out, "    }}")?;
    }

    if config.request_ids {
        writeln!(out, "    map $http_x_correlation_id $correlation_id {{")?;
        writeln!(out, "        default \"$http_x_correlation_id,$request_id\";")?;
        writeln!(out, "        '' $request_id;")?;
        writeln!(out, "    }}")?;
    }
    writeln!(out)?;
    Ok(())
}

fn render_default_service(out: &mut String, config: &RouterConfig) -> RenderResult {
    writeln!(out, "    server {{")?;
    writeln!(
        out,
        "        listen {} default_server{};",
        HTTP_PORT,
        flag(config.use_proxy_protocol, " proxy_protocol")
    )?;
    writeln!(out, "        server_name _;")?;
    writeln!(out, "        server_name_in_redirect off;")?;
    writeln!(out, "        port_in_redirect off;")?;
    writeln!(out, "        set $app_name \"{}\";", config.default_app_name)?;
    writeln!(
        out,
        "        vhost_traffic_status_filter_by_set_key {} application::*;",
        config.default_app_name
    )?;
    render_healthz_location(out)?;
    writeln!(out, "        location / {{")?;
    render_proxy_buffers(out, &config.proxy_buffers)?;
    render_forwarding_headers(out)?;
    writeln!(out, "            proxy_http_version 1.1;")?;
    writeln!(out, "            proxy_set_header Upgrade $http_upgrade;")?;
    writeln!(out, "            proxy_set_header Connection $connection_upgrade;")?;
    if !config.ssl.early_data_methods.is_empty() {
        writeln!(out, "            proxy_set_header Early-Data $ssl_early_data;")?;
    }
    writeln!(out, "            proxy_pass http://{}:80;", config.default_service_ip)?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    Ok(())
}

fn render_healthz(out: &mut String) -> RenderResult {
    writeln!(out, "    server {{")?;
    writeln!(out, "        listen {} default_server;", HEALTHZ_PORT)?;
    writeln!(out, "        server_name _;")?;
    writeln!(out, "        set $app_name \"router-healthz\";")?;
    render_healthz_location(out)?;
    out.push_str(concat!(
        "        location ~ ^/stats/?$ {\n",
        "            vhost_traffic_status_display;\n",
        "            vhost_traffic_status_display_format json;\n",
        "            allow 127.0.0.1;\n",
        "            deny all;\n",
        "        }\n",
        "        location /nginx_status {\n",
        "            stub_status on;\n",
        "            allow 127.0.0.1;\n",
        "            deny all;\n",
        "        }\n",
        "        location / {\n",
        "            return 404;\n",
        "        }\n",
        "    }\n",
    ));
    Ok(())
}

fn render_healthz_location(out: &mut String) -> RenderResult {
    out.push_str(concat!(
        "        location ~ ^/healthz/?$ {\n",
        "            access_log off;\n",
        "            default_type 'text/plain';\n",
        "            return 200;\n",
        "        }\n",
    ));
    Ok(())
}

fn render_whitelist(out: &mut String, config: &RouterConfig, app: &AppConfig) -> RenderResult {
    let active =
        config.enforce_whitelists
            || !config.default_whitelist.is_empty()
            || !app.whitelist.is_empty();
    if !active {
        return Ok(());
    }

    if app.whitelist.is_empty() || config.whitelist_mode == "extend" {
        for entry in &config.default_whitelist {
            writeln!(out, "        allow {};", entry)?;
        }
    }
    for entry in &app.whitelist {
        writeln!(out, "        allow {};", entry)?;
    }
    writeln!(out, "        deny all;")?;
    Ok(())
}

fn render_location(
    out: &mut String,
    config: &RouterConfig,
    app: &AppConfig,
    location: &Location,
) -> RenderResult {
    writeln!(out, "        location {} {{", location.path)?;

    if config.request_ids {
        writeln!(out, "            add_header X-Request-Id $request_id always;")?;
        writeln!(out, "            add_header X-Correlation-Id $correlation_id always;")?;
    }
    if let Some(policy) = referrer_policy(config, app) {
        writeln!(out, "            add_header Referrer-Policy {};", policy)?;
    }

    // Proxied paths go to the owner's backend, which may not be the vhost's app.
    let owner = match config.owner_of(location) {
        Some(owner) if owner.available && !owner.maintenance => owner,
        _ => {
            writeln!(out, "            return 503;")?;
            writeln!(out, "        }}")?;
            return Ok(());
        }
    };

    render_proxy_buffers(out, &owner.nginx.proxy_buffers)?;
    render_forwarding_headers(out)?;
    writeln!(out, "            proxy_connect_timeout {};", owner.connect_timeout)?;
    writeln!(out, "            proxy_send_timeout {};", owner.tcp_timeout)?;
    writeln!(out, "            proxy_read_timeout {};", owner.tcp_timeout)?;
    writeln!(out, "            proxy_http_version 1.1;")?;
    writeln!(out, "            proxy_set_header Upgrade $http_upgrade;")?;
    writeln!(out, "            proxy_set_header Connection $connection_upgrade;")?;
    if !config.ssl.early_data_methods.is_empty() {
        writeln!(out, "            proxy_set_header Early-Data $ssl_early_data;")?;
    }
    if config.request_ids {
        writeln!(out, "            proxy_set_header X-Request-Id $request_id;")?;
        writeln!(out, "            proxy_set_header X-Correlation-Id $correlation_id;")?;
    }
    if config.request_start_header && !app.disable_request_start_header {
        writeln!(out, "            proxy_set_header X-Request-Start \"t=${{msec}}\";")?;
    }

    let hsts = config.ssl.hsts.enabled;
    if config.ssl.enforce || hsts || owner.ssl.enforce {
        writeln!(out, "            if ($access_scheme !~* \"^https|wss$\") {{")?;
        writeln!(out, "                return 301 $uri_scheme://$host$request_uri;")?;
        writeln!(out, "            }}")?;
    }
    if hsts {
        writeln!(out, "            add_header Strict-Transport-Security $sts always;")?;
    }

    writeln!(out, "            proxy_pass http://{}:80;", owner.service_ip)?;
    writeln!(out, "        }}")?;
    Ok(())
}

fn render_proxy_buffers(out: &mut String, buffers: &ProxyBuffersConfig) -> RenderResult {
    writeln!(out, "            proxy_buffering {};", on_off(buffers.enabled))?;
    writeln!(out, "            proxy_buffer_size {};", buffers.size)?;
    writeln!(out, "            proxy_buffers {} {};", buffers.number, buffers.size)?;
    writeln!(out, "            proxy_busy_buffers_size {};", buffers.busy_size)?;
    Ok(())
}

fn render_forwarding_headers(out: &mut String) -> RenderResult {
    out.push_str(concat!(
        "            proxy_set_header Host $host;\n",
        "            proxy_set_header X-Forwarded-For $remote_addr;\n",
        "            proxy_set_header X-Forwarded-Proto $access_scheme;\n",
        "            proxy_set_header X-Forwarded-Port $forwarded_port;\n",
        "            proxy_redirect off;\n",
    ));
    Ok(())
}

fn render_stream(out: &mut String, config: &RouterConfig) -> RenderResult {
    let Some(builder) = &config.builder_config else {
        return Ok(());
    };
    writeln!(out)?;
    writeln!(out, "stream {{")?;
    writeln!(out, "    server {{")?;
    writeln!(
        out,
        "        listen {}{};",
        BUILDER_PORT,
        flag(config.use_proxy_protocol, " proxy_protocol")
    )?;
    writeln!(out, "        proxy_connect_timeout {};", builder.connect_timeout)?;
    writeln!(out, "        proxy_timeout {};", builder.tcp_timeout)?;
    writeln!(out, "        proxy_pass {}:{};", builder.service_ip, BUILDER_PORT)?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    Ok(())
}

/// `server_name` for one of an app's domains.
///
/// Qualified domains are used as-is; bare ones are joined to the platform
/// domain, or matched against any parent domain when none is set.
fn server_name(config: &RouterConfig, app: &AppConfig, domain: &str) -> String {
    if config.enable_regex_domains
        && !app.regex_domain.is_empty()
        && app.regex_domain.contains(domain)
    {
        format!(
            "~^{}\\.(?<domain>.+)$ ~^{}\\.(?<domain>.+)$",
            domain, app.regex_domain
        )
    } else if domain.contains('.') {
        domain.to_string()
    } else if !config.platform_domain.is_empty() {
        format!("{}.{}", domain, config.platform_domain)
    } else {
        format!("~^{}\\.(?<domain>.+)$", domain)
    }
}

/// App policy wins unless it is "none"; a "none" on either side suppresses the header.
fn referrer_policy<'a>(config: &'a RouterConfig, app: &'a AppConfig) -> Option<&'a str> {
    if !app.referrer_policy.is_empty() && app.referrer_policy != "none" {
        Some(&app.referrer_policy)
    } else if !config.referrer_policy.is_empty()
        && app.referrer_policy != "none"
        && config.referrer_policy != "none"
    {
        Some(&config.referrer_policy)
    } else {
        None
    }
}

fn flag(enabled: bool, text: &str) -> &str {
    if enabled {
        text
    } else {
        ""
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuilderConfig, Certificate};

    /// An available app at `index` in `app_configs`, with its root location.
    fn app(index: usize, name: &str, domains: &[&str]) -> AppConfig {
        let mut app = AppConfig::new(&RouterConfig::default());
        app.name = name.to_string();
        app.domains = domains.iter().map(|d| d.to_string()).collect();
        app.service_ip = "10.1.2.3".to_string();
        app.available = true;
        app.locations.push(Location::new(index, "/"));
        app
    }

    fn render(config: &RouterConfig) -> String {
        NginxRenderer::new("/opt/router/ssl").render(config).unwrap()
    }

    #[test]
    fn test_default_snapshot_renders_default_server() {
        let text = render(&RouterConfig::default());

        assert!(text.starts_with("daemon off;\n"));
        assert!(text.contains("worker_processes auto;"));
        assert!(text.contains("ssl_certificate /opt/router/ssl/default/default.crt;"));
        assert!(text.contains("listen 9090 default_server;"));
        assert!(!text.contains("stream {"));
        assert!(!text.contains("ssl_dhparam"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut config = RouterConfig::default();
        config.app_configs.push(app(0, "foo", &["foo", "foo.example.com"]));
        assert_eq!(render(&config), render(&config));
    }

    #[test]
    fn test_app_server_per_domain() {
        let mut config = RouterConfig::default();
        config.platform_domain = "example.com".to_string();
        let mut foo = app(0, "foo", &["foo", "www.foo.io"]);
        foo.certificates
            .insert("www.foo.io".to_string(), Certificate::new("c", "k"));
        config.app_configs.push(foo);

        let text = render(&config);

        assert!(text.contains("server_name foo.example.com;"));
        assert!(text.contains("server_name www.foo.io;"));
        assert!(text.contains("ssl_certificate /opt/router/ssl/www.foo.io.crt;"));
        assert!(!text.contains("/opt/router/ssl/foo.crt"));
        assert!(text.contains("proxy_pass http://10.1.2.3:80;"));
    }

    #[test]
    fn test_bare_domain_without_platform_domain_matches_any_parent() {
        let config = RouterConfig::default();
        let foo = app(0, "foo", &["foo"]);
        assert_eq!(server_name(&config, &foo, "foo"), "~^foo\\.(?<domain>.+)$");
    }

    #[test]
    fn test_unavailable_or_maintenance_returns_503() {
        let mut config = RouterConfig::default();
        let mut down = app(0, "down", &["down.example.com"]);
        down.available = false;
        let mut paused = app(1, "paused", &["paused.example.com"]);
        paused.maintenance = true;
        config.app_configs = vec![down, paused];

        let text = render(&config);
        assert_eq!(text.matches("return 503;").count(), 2);
        assert!(text.contains("error_page 503 @maintenance;"));
        assert!(!text.contains("proxy_pass http://10.1.2.3:80;"));
    }

    #[test]
    fn test_linked_location_proxies_to_owner() {
        let mut config = RouterConfig::default();
        let mut target = app(0, "foo", &["foo.example.com"]);
        target.locations.insert(0, Location::new(1, "/api"));
        let mut bar = app(1, "bar", &["bar.example.com"]);
        bar.service_ip = "10.9.9.9".to_string();
        config.app_configs = vec![target, bar];

        let text = render(&config);
        let foo_server = text
            .split("server {")
            .find(|block| block.contains("server_name foo.example.com;"))
            .unwrap();
        assert!(foo_server.contains("location /api {"));
        assert!(foo_server.contains("proxy_pass http://10.9.9.9:80;"));
    }

    #[test]
    fn test_same_named_apps_proxy_to_their_own_backends() {
        let mut config = RouterConfig::default();
        let web = app(0, "web", &["a.example.com"]);
        let mut canary = app(1, "web", &["b.example.com"]);
        canary.service_ip = "10.0.0.2".to_string();
        config.app_configs = vec![web, canary];

        let text = render(&config);
        let canary_server = text
            .split("server {")
            .find(|block| block.contains("server_name b.example.com;"))
            .unwrap();
        assert!(canary_server.contains("proxy_pass http://10.0.0.2:80;"));
        assert!(!canary_server.contains("10.1.2.3"));
    }

    #[test]
    fn test_enforced_ssl_and_hsts() {
        let mut config = RouterConfig::default();
        config.ssl.hsts.enabled = true;
        config.ssl.hsts.include_sub_domains = true;
        config.app_configs.push(app(0, "foo", &["foo.example.com"]));

        let text = render(&config);
        assert!(text.contains("'https' 'max-age=15552000; includeSubDomains';"));
        assert!(text.contains("return 301 $uri_scheme://$host$request_uri;"));
        assert!(text.contains("add_header Strict-Transport-Security $sts always;"));
    }

    #[test]
    fn test_whitelist_modes() {
        let mut config = RouterConfig::default();
        config.default_whitelist = vec!["10.0.0.0/8".to_string()];
        let mut foo = app(0, "foo", &["foo.example.com"]);
        foo.whitelist = vec!["1.2.3.4".to_string()];
        config.app_configs.push(foo);

        let text = render(&config);
        assert!(text.contains("allow 10.0.0.0/8;"));
        assert!(text.contains("allow 1.2.3.4;"));

        config.whitelist_mode = "override".to_string();
        let text = render(&config);
        assert!(!text.contains("allow 10.0.0.0/8;"));
        assert!(text.contains("allow 1.2.3.4;"));
    }

    #[test]
    fn test_referrer_policy_precedence() {
        let mut config = RouterConfig::default();
        config.referrer_policy = "same-origin".to_string();
        let mut foo = app(0, "foo", &[]);

        assert_eq!(referrer_policy(&config, &foo), Some("same-origin"));
        foo.referrer_policy = "no-referrer".to_string();
        assert_eq!(referrer_policy(&config, &foo), Some("no-referrer"));
        foo.referrer_policy = "none".to_string();
        assert_eq!(referrer_policy(&config, &foo), None);
    }

    #[test]
    fn test_builder_stream_and_dhparam() {
        let mut config = RouterConfig::default();
        config.ssl.dh_param = "params".to_string();
        config.builder_config = Some(BuilderConfig {
            service_ip: "10.0.0.5".to_string(),
            ..BuilderConfig::default()
        });

        let text = render(&config);
        assert!(text.contains("ssl_dhparam /opt/router/ssl/dhparam.pem;"));
        assert!(text.contains("proxy_pass 10.0.0.5:2222;"));
        assert!(text.contains("proxy_timeout 1200s;"));
    }
}
