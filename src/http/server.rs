//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the root route and static fallback
//! - Wire up the pipeline stages in order
//! - Bind server to listener and shut down on request
//!
//! # Pipeline (outermost first)
//! ```text
//! request id → trace span → metrics → security headers → compression
//!     → panic catcher → GET / | static assets → 404
//! ```

use std::io;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ServerConfig;
use crate::http::assets::StaticAssets;
use crate::http::compression::compression_layer;
use crate::http::error::{handle_not_found, handle_panic, not_found, ServeError};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestSpan};
use crate::observability::metrics::track_requests;
use crate::security::{security_headers_middleware, SecurityHeaderError, SecurityHeaders};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<StaticAssets>,
}

/// HTTP server for the static site.
pub struct HttpServer {
    router: Router,
    config: Arc<ServerConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self, SecurityHeaderError> {
        let security = Arc::new(SecurityHeaders::from_config(&config.security)?);
        let state = AppState {
            assets: Arc::new(StaticAssets::new(&config.assets, &config.cache)),
        };

        let routes = Router::new()
            .route("/", get(root_handler).fallback(handle_not_found))
            .fallback(static_handler)
            .with_state(state);
        let router = with_pipeline(routes, &config, security);

        Ok(Self {
            router,
            config: Arc::new(config),
        })
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.config.assets.root.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Wrap `routes` in the request pipeline. Layers listed first run first on
/// the way in and last on the way out.
pub fn with_pipeline(
    routes: Router,
    config: &ServerConfig,
    security: Arc<SecurityHeaders>,
) -> Router {
    routes.layer(
        ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(RequestSpan)
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(propagate_request_id_layer())
            .layer(middleware::from_fn(track_requests))
            .layer(middleware::from_fn_with_state(
                security,
                security_headers_middleware,
            ))
            .layer(compression_layer(&config.compression))
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}

/// `GET /`: the default document, independent of the static stage.
async fn root_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, ServeError> {
    state.assets.serve_index(&method, &headers).await
}

/// Everything else: static assets, then 404.
async fn static_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ServeError> {
    let served = state
        .assets
        .serve(request.method(), request.uri(), request.headers())
        .await?;
    Ok(served.unwrap_or_else(not_found))
}
