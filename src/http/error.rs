//! Error and fallback responses.
//!
//! Two terminal stages: the unhandled-error stage turns any failure into a
//! logged `500 Something broke!`, and the not-found stage answers whatever
//! nothing else claimed.

use std::any::Any;
use std::io;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Fixed body of every 500 response.
pub const INTERNAL_ERROR_BODY: &str = "Something broke!";

/// Body of every 404 response.
pub const NOT_FOUND_BODY: &str = "Not Found";

/// A server-side fault while building a response.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("default document {} could not be opened: {source}", .path.display())]
    DefaultDocument {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build response: {0}")]
    Http(#[from] axum::http::Error),
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, detail = ?self, "Request failed");
        internal_error()
    }
}

/// `500 Something broke!`
pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

/// `404 Not Found`
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

/// Handler form of [`not_found`] for router fallbacks.
pub async fn handle_not_found() -> Response {
    not_found()
}

/// Response for a handler that panicked.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");
    internal_error()
}
