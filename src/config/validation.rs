//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, sizes)
//! - Reject header values that cannot be sent on the wire
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{CacheConfig, ServerConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }

    let index = &config.assets.index;
    if index.is_empty() || index.contains('/') || index.contains('\\') || index.starts_with('.') {
        errors.push(ValidationError::new(
            "assets.index",
            "must be a plain, non-hidden file name",
        ));
    }

    validate_cache(&config.cache, &mut errors);

    let compression = &config.compression;
    if compression.enabled && !compression.gzip && !compression.deflate {
        errors.push(ValidationError::new(
            "compression",
            "enabled but neither gzip nor deflate is offered",
        ));
    }

    let security = &config.security;
    for (field, sources) in [
        ("security.script_src", &security.script_src),
        ("security.style_src", &security.style_src),
        ("security.img_src", &security.img_src),
        ("security.font_src", &security.font_src),
    ] {
        if sources.is_empty() {
            errors.push(ValidationError::new(field, "must list at least one source"));
        }
        for source in sources {
            if !is_valid_csp_source(source) {
                errors.push(ValidationError::new(
                    field,
                    format!("invalid source expression {source:?}"),
                ));
            }
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level {:?}", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address such as 127.0.0.1:9090",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_cache(cache: &CacheConfig, errors: &mut Vec<ValidationError>) {
    for (field, extensions) in [
        ("cache.no_cache_extensions", &cache.no_cache_extensions),
        ("cache.long_lived_extensions", &cache.long_lived_extensions),
    ] {
        for ext in extensions {
            if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                errors.push(ValidationError::new(
                    field,
                    format!("{ext:?} is not a bare extension (write \"png\", not \".png\")"),
                ));
            }
        }
    }

    if let Some(ext) = cache
        .no_cache_extensions
        .iter()
        .find(|ext| cache.long_lived_extensions.contains(ext))
    {
        errors.push(ValidationError::new(
            "cache",
            format!("extension {ext:?} is both no-cache and long-lived"),
        ));
    }
}

/// A CSP source must be a single token that survives inside a header value.
fn is_valid_csp_source(source: &str) -> bool {
    !source.is_empty()
        && source
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b';' && b != b',')
}
