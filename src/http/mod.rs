//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, pipeline layers)
//!     → request.rs (request ID, tracing span)
//!     → assets.rs (resolve path under the public root)
//!     → cache.rs (Cache-Control, validators, 304/412)
//!     → range.rs (206 / 416 byte ranges)
//!     → error.rs (500 / 404 terminal responses)
//!     → Send to client
//! ```

pub mod assets;
pub mod cache;
pub mod compression;
pub mod error;
pub mod range;
pub mod request;
pub mod server;

pub use assets::StaticAssets;
pub use error::ServeError;
pub use request::X_REQUEST_ID;
pub use server::{with_pipeline, AppState, HttpServer};
