//! HTTP middleware: CORS, security headers and request ids.
//!
//! ```ignore
//! use axum_helpers::http::{create_cors_layer, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(&config.cors_allowed_origins)?);
//! ```

pub mod cors;
pub mod request_id;
pub mod security;

pub use cors::create_cors_layer;
pub use request_id::{MakeRequestUuidV7, REQUEST_ID_HEADER, request_span};
pub use security::security_headers;
