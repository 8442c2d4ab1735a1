//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::sync::{Arc, Mutex};
use std::path::{Path, PathBuf};

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Method, Request},
    response::Response,
    Router,
};
use static_site_server::config::ServerConfig;
use static_site_server::http::HttpServer;
use tempfile::TempDir;
use tower::ServiceExt;

/// A valid 1x1 PNG.
pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64,
    0x60, 0xf8, 0x5f, 0x0f, 0x00, 0x02, 0x87, 0x01, 0x80, 0xeb, 0x47, 0xba, 0x92, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

pub const INDEX_HTML: &str = "<!DOCTYPE html><html><body><h1>Home</h1></body></html>\n";

/// A throwaway public root populated with a small site.
pub struct Site {
    dir: TempDir,
}

impl Site {
    /// index.html, logo.png, css/app.css (several KB), notes.txt (tiny),
    /// about/index.html, docs/ (no index), .env
    pub fn new() -> Self {
        let site = Self::empty();
        site.write("index.html", INDEX_HTML.as_bytes());
        site.write("logo.png", PNG);
        site.write("css/app.css", stylesheet().as_bytes());
        site.write("notes.txt", b"tiny");
        site.write("about/index.html", b"<h1>About</h1>");
        site.write("docs/readme.md", b"# Docs");
        site.write(".env", b"SECRET=1");
        site
    }

    /// A public root with no files at all.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.file(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn read(&self, relative: &str) -> Vec<u8> {
        fs::read(self.file(relative)).unwrap()
    }

    pub fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.assets.root = self.root().to_path_buf();
        config
    }

    pub fn router(&self) -> Router {
        HttpServer::new(self.config()).unwrap().router()
    }
}

/// Roughly 6 KB of compressible CSS.
pub fn stylesheet() -> String {
    (0..120)
        .map(|i| format!(".rule-{i} {{ margin: {i}px; padding: 0 {i}px; }}\n"))
        .collect()
}

pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get(router: &Router, uri: &str) -> Response {
    send(router, request(Method::GET, uri).body(Body::empty()).unwrap()).await
}

pub async fn body(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Log output captured from a thread-local subscriber.
#[derive(Clone, Default)]
pub struct Logs(Arc<Mutex<Vec<u8>>>);

impl Logs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Logs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's events into a buffer until the guard drops.
/// `#[tokio::test]` runs on a single thread, so handlers are covered.
pub fn capture_logs() -> (Logs, tracing::subscriber::DefaultGuard) {
    let logs = Logs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
