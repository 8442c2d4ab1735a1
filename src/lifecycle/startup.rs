//! Startup orchestration.
//!
//! # Responsibilities
//! - Check the public root before traffic arrives
//! - Bind the listener and announce where the server runs
//!
//! # Design Decisions
//! - A missing public root is logged, not fatal: assets are read per request
//! - Bind failures are fatal

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::{AssetsConfig, ListenerConfig};

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Warn about a public root that cannot serve anything yet.
pub fn check_public_root(assets: &AssetsConfig) {
    match std::fs::metadata(&assets.root) {
        Ok(m) if m.is_dir() => {
            if !assets.root.join(&assets.index).is_file() {
                tracing::warn!(
                    root = %assets.root.display(),
                    index = %assets.index,
                    "Default document missing; GET / will fail"
                );
            }
        }
        Ok(_) => tracing::warn!(root = %assets.root.display(), "Public root is not a directory"),
        Err(e) => tracing::warn!(root = %assets.root.display(), error = %e, "Public root unavailable"),
    }
}

/// Bind the configured address and log the single startup line.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    let bind_error = |source| StartupError::Bind {
        address: address.clone(),
        source,
    };

    let listener = TcpListener::bind(&address).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    tracing::info!(
        address = %local_addr,
        "Server running at {}",
        public_url(&config.host, local_addr)
    );
    Ok(listener)
}

/// The URL a local browser would use for `host` bound at `addr`.
pub fn public_url(host: &str, addr: SocketAddr) -> String {
    match host {
        "0.0.0.0" | "::" | "[::]" | "localhost" => format!("http://localhost:{}", addr.port()),
        _ => format!("http://{addr}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_hosts_display_as_localhost() {
        let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert_eq!(public_url("0.0.0.0", addr), "http://localhost:8080");

        let addr: SocketAddr = "127.0.0.1:3000".parse().unwrap();
        assert_eq!(public_url("127.0.0.1", addr), "http://127.0.0.1:3000");
    }

    #[tokio::test]
    async fn bind_reports_actual_port() {
        let config = ListenerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_conflict_is_an_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ListenerConfig {
            host: "127.0.0.1".into(),
            port: taken.local_addr().unwrap().port(),
        };
        let err = bind(&config).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to bind 127.0.0.1:"));
    }
}
