//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (attach CSP and companion headers)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Policy is static configuration, never derived from request content
//! - Cross-origin embedding of assets stays possible by default

pub mod csp;
pub mod headers;

pub use csp::ContentSecurityPolicy;
pub use headers::{security_headers_middleware, SecurityHeaderError, SecurityHeaders};
