//! Security response headers.
//!
//! # Responsibilities
//! - Build the Content-Security-Policy from config on top of the baseline
//! - Add the companion protective headers (HSTS, nosniff, frame options, ...)
//! - Leave cross-origin embedder/resource policies off unless configured
//!
//! # Design Decisions
//! - Header values are rendered once at startup; requests only copy them
//! - A header an inner stage already set is never overwritten
//! - Status and body are never touched

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderName, HeaderValue, InvalidHeaderValue},
        HeaderMap, Request,
    },
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;
use crate::security::csp::ContentSecurityPolicy;

pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");
pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");
pub const ORIGIN_AGENT_CLUSTER: HeaderName = HeaderName::from_static("origin-agent-cluster");
pub const X_DOWNLOAD_OPTIONS: HeaderName = HeaderName::from_static("x-download-options");
pub const X_PERMITTED_CROSS_DOMAIN_POLICIES: HeaderName =
    HeaderName::from_static("x-permitted-cross-domain-policies");

/// A configured header value could not be encoded.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {name} header: {source}")]
pub struct SecurityHeaderError {
    pub name: HeaderName,
    #[source]
    pub source: InvalidHeaderValue,
}

/// The precomputed set of security headers attached to every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: HeaderMap,
}

impl SecurityHeaders {
    /// Render the policy described by `config`.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, SecurityHeaderError> {
        let mut headers = HeaderMap::new();
        if !config.enable_headers {
            return Ok(Self { headers });
        }

        let csp = Self::content_security_policy(config);
        let hsts = format!("max-age={}; includeSubDomains", config.hsts_max_age_secs);

        let mut entries: Vec<(HeaderName, String)> = vec![
            (header::CONTENT_SECURITY_POLICY, csp.to_header_value()),
            (CROSS_ORIGIN_OPENER_POLICY, "same-origin".into()),
            (ORIGIN_AGENT_CLUSTER, "?1".into()),
            (header::REFERRER_POLICY, "no-referrer".into()),
            (header::STRICT_TRANSPORT_SECURITY, hsts),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".into()),
            (header::X_DNS_PREFETCH_CONTROL, "off".into()),
            (X_DOWNLOAD_OPTIONS, "noopen".into()),
            (header::X_FRAME_OPTIONS, "SAMEORIGIN".into()),
            (X_PERMITTED_CROSS_DOMAIN_POLICIES, "none".into()),
            (header::X_XSS_PROTECTION, "0".into()),
        ];
        if config.cross_origin_embedder_policy {
            entries.push((CROSS_ORIGIN_EMBEDDER_POLICY, "require-corp".into()));
        }
        if config.cross_origin_resource_policy {
            entries.push((CROSS_ORIGIN_RESOURCE_POLICY, "same-origin".into()));
        }

        for (name, value) in entries {
            let value = HeaderValue::from_str(&value).map_err(|source| SecurityHeaderError {
                name: name.clone(),
                source,
            })?;
            headers.insert(name, value);
        }

        Ok(Self { headers })
    }

    /// The CSP: baseline directives with the configured categories layered on.
    pub fn content_security_policy(config: &SecurityConfig) -> ContentSecurityPolicy {
        ContentSecurityPolicy::baseline()
            .script_src(config.script_src.iter().cloned())
            .style_src(config.style_src.iter().cloned())
            .img_src(config.img_src.iter().cloned())
            .font_src(config.font_src.iter().cloned())
    }

    /// Copy the policy onto `target`, keeping anything already present.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            target.entry(name).or_insert_with(|| value.clone());
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Middleware attaching the security headers to every response.
pub async fn security_headers_middleware(
    State(policy): State<Arc<SecurityHeaders>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    policy.apply(response.headers_mut());
    response
}
