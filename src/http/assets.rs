//! Static asset resolution and serving.
//!
//! # Responsibilities
//! - Map a request path onto a file under the public root
//! - Serve directory default documents and redirect slash-less directories
//! - Attach Cache-Control, validators and content headers
//! - Answer conditional requests (304 / 412)
//! - Answer single byte-range requests (206 / 416)
//! - Stream file bodies from a per-request handle
//!
//! # Design Decisions
//! - Anything that is not a servable file falls through (`Ok(None)`); the
//!   caller turns that into a 404
//! - `..` segments and dotfiles never resolve
//! - Redirect targets are always same-origin paths
//! - Filesystem faults other than "not found" surface as `ServeError`
//! - Nothing is cached in memory; every request stats and opens the file

use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Response,
};
use percent_encoding::percent_decode_str;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::config::{AssetsConfig, CacheConfig};
use crate::http::cache::{self, CacheRules, Condition, Validators};
use crate::http::error::ServeError;
use crate::http::range::{self, RangeRequest};

/// Where a request path landed.
#[derive(Debug)]
pub enum Resolution {
    /// A regular file and its metadata.
    File(PathBuf, Metadata),
    /// A directory requested without its trailing slash.
    Redirect(String),
    /// Nothing servable.
    NotFound,
}

/// The static file stage.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
    index: String,
    redirect_directories: bool,
    accept_ranges: bool,
    rules: CacheRules,
    etag: bool,
    last_modified: bool,
}

impl StaticAssets {
    pub fn new(assets: &AssetsConfig, cache: &CacheConfig) -> Self {
        Self {
            root: assets.root.clone(),
            index: assets.index.clone(),
            redirect_directories: assets.redirect_directories,
            accept_ranges: assets.accept_ranges,
            rules: CacheRules::from_config(cache),
            etag: cache.etag,
            last_modified: cache.last_modified,
        }
    }

    /// Serve `uri` from the public root. `Ok(None)` means fall through.
    pub async fn serve(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> Result<Option<Response>, ServeError> {
        if method != Method::GET && method != Method::HEAD {
            return Ok(None);
        }

        match self.resolve(uri.path()).await? {
            Resolution::File(path, metadata) => {
                self.respond(&path, &metadata, method, headers).await.map(Some)
            }
            Resolution::Redirect(location) => {
                let location = match uri.query() {
                    Some(query) => format!("{location}?{query}"),
                    None => location,
                };
                redirect(&location).map(Some)
            }
            Resolution::NotFound => Ok(None),
        }
    }

    /// Serve the root default document. A missing document is a server
    /// fault here, not a fall-through.
    pub async fn serve_index(
        &self,
        method: &Method,
        headers: &HeaderMap,
    ) -> Result<Response, ServeError> {
        let path = self.root.join(&self.index);
        let metadata = fs::metadata(&path)
            .await
            .map_err(|source| ServeError::DefaultDocument {
                path: path.clone(),
                source,
            })?;
        if !metadata.is_file() {
            return Err(ServeError::DefaultDocument {
                path,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }
        self.respond(&path, &metadata, method, headers).await
    }

    /// Resolve a raw (still percent-encoded) request path.
    pub async fn resolve(&self, request_path: &str) -> Result<Resolution, ServeError> {
        let Some(relative) = sanitize_path(request_path) else {
            tracing::debug!(path = %request_path, "Rejected request path");
            return Ok(Resolution::NotFound);
        };

        let path = self.root.join(relative);
        let Some(metadata) = self.stat(&path).await? else {
            return Ok(Resolution::NotFound);
        };

        if metadata.is_file() {
            return Ok(Resolution::File(path, metadata));
        }
        if !metadata.is_dir() {
            return Ok(Resolution::NotFound);
        }

        if !request_path.ends_with('/') {
            return Ok(if self.redirect_directories {
                // `//host` would be read as a protocol-relative URL.
                Resolution::Redirect(format!("/{}/", request_path.trim_start_matches('/')))
            } else {
                Resolution::NotFound
            });
        }

        let index = path.join(&self.index);
        match self.stat(&index).await? {
            Some(metadata) if metadata.is_file() => Ok(Resolution::File(index, metadata)),
            _ => Ok(Resolution::NotFound),
        }
    }

    async fn stat(&self, path: &Path) -> Result<Option<Metadata>, ServeError> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if is_missing(&e) => Ok(None),
            Err(source) => Err(ServeError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    async fn respond(
        &self,
        path: &Path,
        metadata: &Metadata,
        method: &Method,
        request: &HeaderMap,
    ) -> Result<Response, ServeError> {
        let policy = self.rules.policy_for(path);
        let validators = Validators::from_metadata(metadata, self.etag, self.last_modified);

        let status = match cache::evaluate(request, &validators) {
            Condition::PreconditionFailed => {
                return Ok(Response::builder()
                    .status(StatusCode::PRECONDITION_FAILED)
                    .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                    .body(Body::from("Precondition Failed"))?);
            }
            Condition::NotModified => StatusCode::NOT_MODIFIED,
            Condition::Proceed => StatusCode::OK,
        };

        let mut builder = Response::builder()
            .status(status)
            .header(header::CACHE_CONTROL, policy.to_header_value());
        if self.accept_ranges {
            builder = builder.header(header::ACCEPT_RANGES, "bytes");
        }
        if let Some(etag) = &validators.etag {
            builder = builder.header(header::ETAG, etag.as_str());
        }
        if let Some(last_modified) = validators.last_modified_header() {
            builder = builder.header(header::LAST_MODIFIED, last_modified);
        }

        if status == StatusCode::NOT_MODIFIED {
            tracing::debug!(path = %path.display(), "Not modified");
            return Ok(builder.body(Body::empty())?);
        }

        let len = metadata.len();
        let range = match self.requested_range(request, &validators, len) {
            RangeRequest::Full => None,
            RangeRequest::Partial(range) => Some(range),
            RangeRequest::Unsatisfiable => {
                tracing::debug!(path = %path.display(), "Range not satisfiable");
                return Ok(builder
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(header::CONTENT_RANGE, range::unsatisfied_content_range(len))
                    .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                    .body(Body::from("Range Not Satisfiable"))?);
            }
        };

        builder = builder.header(header::CONTENT_TYPE, content_type(path));
        builder = match range {
            Some(range) => builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, range.content_range(len))
                .header(header::CONTENT_LENGTH, range.size()),
            None => builder.header(header::CONTENT_LENGTH, len),
        };

        if method == Method::HEAD {
            return Ok(builder.body(Body::empty())?);
        }

        let io_error = |source| ServeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = fs::File::open(path).await.map_err(io_error)?;

        let body = match range {
            Some(range) => {
                file.seek(SeekFrom::Start(range.start)).await.map_err(io_error)?;
                tracing::debug!(
                    path = %path.display(),
                    start = range.start,
                    end = range.end,
                    "Serving range"
                );
                Body::from_stream(ReaderStream::new(file.take(range.size())))
            }
            None => {
                tracing::debug!(path = %path.display(), bytes = len, "Serving file");
                Body::from_stream(ReaderStream::new(file))
            }
        };

        Ok(builder.body(body)?)
    }

    fn requested_range(
        &self,
        request: &HeaderMap,
        validators: &Validators,
        len: u64,
    ) -> RangeRequest {
        if !self.accept_ranges {
            return RangeRequest::Full;
        }
        let Some(value) = request.get(header::RANGE).and_then(|v| v.to_str().ok()) else {
            return RangeRequest::Full;
        };
        if !cache::range_is_fresh(request, validators) {
            return RangeRequest::Full;
        }
        range::parse_range(value, len)
    }
}

/// Decode and check a request path, returning it relative to the root.
///
/// Rejects undecodable paths, NUL bytes, backslashes, `..` and any segment
/// starting with `.`.
pub fn sanitize_path(request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    if decoded.contains('\0') || decoded.contains('\\') {
        return None;
    }

    let mut relative = PathBuf::new();
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('.') {
            return None;
        }
        relative.push(segment);
    }
    Some(relative)
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// `Content-Type` for `path`; textual types are labelled UTF-8.
pub fn content_type(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let textual = mime.type_() == mime_guess::mime::TEXT
        || matches!(mime.subtype().as_str(), "javascript" | "json" | "xml");
    if textual && mime.get_param(mime_guess::mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.to_string()
    }
}

fn redirect(location: &str) -> Result<Response, ServeError> {
    Ok(Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, location)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(format!("Redirecting to {location}")))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_accepts_plain_paths() {
        assert_eq!(sanitize_path("/"), Some(PathBuf::new()));
        assert_eq!(sanitize_path("/css/app.css"), Some(PathBuf::from("css/app.css")));
        assert_eq!(sanitize_path("//css//app.css"), Some(PathBuf::from("css/app.css")));
        assert_eq!(
            sanitize_path("/my%20file.txt"),
            Some(PathBuf::from("my file.txt"))
        );
    }

    #[test]
    fn sanitize_rejects_escapes_and_dotfiles() {
        for path in [
            "/../etc/passwd",
            "/css/../../secret",
            "/%2e%2e/secret",
            "/..%2fsecret",
            "/.env",
            "/.git/config",
            "/a/./b",
            "/nul%00byte",
            "/back%5cslash",
            "/bad%ff",
        ] {
            assert_eq!(sanitize_path(path), None, "{path}");
        }
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("app.css")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("logo.png")), "image/png");
        assert_eq!(
            content_type(Path::new("data.bin.unknownext")),
            "application/octet-stream"
        );
        assert!(content_type(Path::new("app.js")).ends_with("javascript; charset=utf-8"));
    }
}
