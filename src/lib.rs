//! Static site server library.
//!
//! Serves a public directory over HTTP with security headers, negotiated
//! compression and per-file-type cache policy.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
