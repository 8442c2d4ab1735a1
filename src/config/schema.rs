//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive `Deserialize` for loading from config files.

use std::path::PathBuf;

use serde::Deserialize;

/// Root configuration for the static site server.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Public root and default document.
    pub assets: AssetsConfig,

    /// Cache-Control rules per file type.
    pub cache: CacheConfig,

    /// Response compression.
    pub compression: CompressionConfig,

    /// Security response headers.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Overridden by the `PORT` environment variable.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` pair handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Where static assets come from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Public root directory. Requests never resolve outside of it.
    pub root: PathBuf,

    /// Default document served for `/` and directory paths ending in `/`.
    pub index: String,

    /// Redirect directory paths lacking a trailing slash to the slashed form.
    pub redirect_directories: bool,

    /// Advertise and honor single `bytes=` ranges.
    pub accept_ranges: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/public")),
            index: "index.html".to_string(),
            redirect_directories: true,
            accept_ranges: true,
        }
    }
}

/// Cache-Control policy by file type.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// max-age for files matching no specific rule (30 days).
    pub default_max_age_secs: u64,

    /// Extensions (without the dot) that are revalidated on every use.
    pub no_cache_extensions: Vec<String>,

    /// Extensions (without the dot) cached for `long_lived_max_age_secs`.
    pub long_lived_extensions: Vec<String>,

    /// max-age for long-lived assets (1 year).
    pub long_lived_max_age_secs: u64,

    /// Emit `ETag` validators.
    pub etag: bool,

    /// Emit `Last-Modified` validators.
    pub last_modified: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_max_age_secs: 30 * 24 * 60 * 60,
            no_cache_extensions: vec!["html".to_string()],
            long_lived_extensions: ["jpg", "jpeg", "png", "gif", "ico"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            long_lived_max_age_secs: 31_536_000,
            etag: true,
            last_modified: true,
        }
    }
}

/// Response compression configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Enable response compression.
    pub enabled: bool,

    /// Bodies smaller than this many bytes are sent as-is.
    pub min_size: u16,

    /// Offer gzip.
    pub gzip: bool,

    /// Offer deflate.
    pub deflate: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_size: 1024,
            gzip: true,
            deflate: true,
        }
    }
}

/// Security header configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,

    /// `script-src` sources.
    pub script_src: Vec<String>,

    /// `style-src` sources.
    pub style_src: Vec<String>,

    /// `img-src` sources.
    pub img_src: Vec<String>,

    /// `font-src` sources.
    pub font_src: Vec<String>,

    /// Send `Cross-Origin-Embedder-Policy: require-corp`.
    pub cross_origin_embedder_policy: bool,

    /// Send `Cross-Origin-Resource-Policy: same-origin`.
    pub cross_origin_resource_policy: bool,

    /// HSTS max-age in seconds.
    pub hsts_max_age_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            script_src: sources(&["'self'", "cdnjs.cloudflare.com", "cdn.tailwindcss.com"]),
            style_src: sources(&["'self'", "'unsafe-inline'", "cdnjs.cloudflare.com"]),
            img_src: sources(&["'self'", "data:", "https:"]),
            font_src: sources(&["'self'", "cdnjs.cloudflare.com"]),
            cross_origin_embedder_policy: false,
            cross_origin_resource_policy: false,
            hsts_max_age_secs: 31_536_000,
        }
    }
}

fn sources(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.assets.index, "index.html");
        assert_eq!(config.cache.default_max_age_secs, 2_592_000);
        assert!(config.assets.root.ends_with("public"));
        assert!(config.assets.accept_ranges);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            port = 8080

            [security]
            script_src = ["'self'"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.security.script_src, vec!["'self'"]);
        assert_eq!(config.security.font_src, vec!["'self'", "cdnjs.cloudflare.com"]);
        assert!(!config.security.cross_origin_embedder_policy);
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let listener = ListenerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
        };
        assert_eq!(listener.bind_address(), "127.0.0.1:8080");
    }
}
