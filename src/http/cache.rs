//! Cache-Control policy and conditional request handling.
//!
//! # Responsibilities
//! - Pick the Cache-Control directive for a file by its extension
//! - Derive `ETag` / `Last-Modified` validators from file metadata
//! - Evaluate `If-None-Match`, `If-Modified-Since`, `If-Match` and
//!   `If-Unmodified-Since` against those validators
//! - Decide whether `If-Range` still allows a partial response
//!
//! # Design Decisions
//! - Extension match is a case-sensitive suffix match on the file name
//! - A no-cache rule beats a long-lived rule, which beats the default max-age
//! - ETags are weak and stat based: `W/"<size hex>-<mtime ms hex>"`

use std::fs::Metadata;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::{header, HeaderMap};

use crate::config::CacheConfig;

/// Cache directive for a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Clients must revalidate before reuse.
    NoCache,
    /// Public cache with the given max-age in seconds.
    Public(u64),
}

impl CachePolicy {
    /// Convert to Cache-Control header value.
    pub fn to_header_value(self) -> String {
        match self {
            Self::NoCache => "no-cache".to_string(),
            Self::Public(max_age) => format!("public, max-age={max_age}"),
        }
    }
}

/// Extension-based cache rules.
#[derive(Debug, Clone)]
pub struct CacheRules {
    no_cache: Vec<String>,
    long_lived: Vec<String>,
    long_lived_max_age: u64,
    default_max_age: u64,
}

impl CacheRules {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            no_cache: config.no_cache_extensions.clone(),
            long_lived: config.long_lived_extensions.clone(),
            long_lived_max_age: config.long_lived_max_age_secs,
            default_max_age: config.default_max_age_secs,
        }
    }

    /// The policy for the file at `path`.
    pub fn policy_for(&self, path: &Path) -> CachePolicy {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        if has_extension(&name, &self.no_cache) {
            CachePolicy::NoCache
        } else if has_extension(&name, &self.long_lived) {
            CachePolicy::Public(self.long_lived_max_age)
        } else {
            CachePolicy::Public(self.default_max_age)
        }
    }
}

fn has_extension(name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| {
        name.strip_suffix(ext.as_str())
            .is_some_and(|stem| stem.ends_with('.'))
    })
}

/// Validators describing one version of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<SystemTime>,
}

impl Validators {
    /// Build validators from file metadata, honoring which ones are enabled.
    pub fn from_metadata(metadata: &Metadata, etag: bool, last_modified: bool) -> Self {
        let modified = metadata.modified().ok();
        Self {
            etag: etag.then(|| weak_etag(metadata.len(), modified)),
            last_modified: if last_modified { modified.map(truncate_to_secs) } else { None },
        }
    }

    /// `Last-Modified` as an HTTP date.
    pub fn last_modified_header(&self) -> Option<String> {
        self.last_modified.map(httpdate::fmt_http_date)
    }
}

/// Stat-based weak entity tag.
pub fn weak_etag(len: u64, modified: Option<SystemTime>) -> String {
    let millis = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("W/\"{len:x}-{millis:x}\"")
}

/// HTTP dates carry whole seconds; compare on that resolution.
fn truncate_to_secs(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::from_secs(d.as_secs()),
        Err(_) => time,
    }
}

/// Outcome of evaluating request preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Serve the full representation.
    Proceed,
    /// The client's cached copy is current: answer 304.
    NotModified,
    /// `If-Match` / `If-Unmodified-Since` failed: answer 412.
    PreconditionFailed,
}

/// Evaluate conditional request headers against `validators`.
pub fn evaluate(request: &HeaderMap, validators: &Validators) -> Condition {
    if precondition_failed(request, validators) {
        Condition::PreconditionFailed
    } else if is_fresh(request, validators) {
        Condition::NotModified
    } else {
        Condition::Proceed
    }
}

fn precondition_failed(request: &HeaderMap, validators: &Validators) -> bool {
    if let Some(if_match) = header_str(request, header::IF_MATCH) {
        return match &validators.etag {
            None => true,
            Some(etag) => if_match.trim() != "*" && !etag_list_matches(if_match, etag),
        };
    }

    if let Some(since) = header_str(request, header::IF_UNMODIFIED_SINCE) {
        if let (Ok(since), Some(modified)) = (httpdate::parse_http_date(since), validators.last_modified) {
            return modified > since;
        }
    }

    false
}

fn is_fresh(request: &HeaderMap, validators: &Validators) -> bool {
    let if_none_match = header_str(request, header::IF_NONE_MATCH);
    let if_modified_since = header_str(request, header::IF_MODIFIED_SINCE);

    if if_none_match.is_none() && if_modified_since.is_none() {
        return false;
    }

    // An end-to-end reload from the client bypasses the cached copy.
    if header_str(request, header::CACHE_CONTROL).is_some_and(has_no_cache_directive) {
        return false;
    }

    if let Some(if_none_match) = if_none_match {
        if if_none_match.trim() != "*" {
            let matched = validators
                .etag
                .as_deref()
                .is_some_and(|etag| etag_list_matches(if_none_match, etag));
            if !matched {
                return false;
            }
        }
    }

    if let Some(since) = if_modified_since {
        let not_modified = match (httpdate::parse_http_date(since), validators.last_modified) {
            (Ok(since), Some(modified)) => modified <= since,
            _ => false,
        };
        if !not_modified {
            return false;
        }
    }

    true
}

/// Whether a `Range` request may be honored. Without `If-Range` it always
/// may; otherwise the entity tag or date must still describe the file.
pub fn range_is_fresh(request: &HeaderMap, validators: &Validators) -> bool {
    let Some(if_range) = header_str(request, header::IF_RANGE) else {
        return true;
    };

    if if_range.contains('"') {
        return validators
            .etag
            .as_deref()
            .is_some_and(|etag| opaque_tag(if_range.trim()) == opaque_tag(etag));
    }

    match (httpdate::parse_http_date(if_range), validators.last_modified) {
        (Ok(date), Some(modified)) => modified <= date,
        _ => false,
    }
}

/// Weak comparison of a comma separated entity-tag list against `etag`.
fn etag_list_matches(list: &str, etag: &str) -> bool {
    let etag = opaque_tag(etag);
    list.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .any(|tag| opaque_tag(tag) == etag)
}

fn opaque_tag(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

fn has_no_cache_directive(cache_control: &str) -> bool {
    cache_control
        .split(',')
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
