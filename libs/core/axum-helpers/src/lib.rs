//! # Axum Helpers
//!
//! Shared building blocks for the Axum services in this workspace.
//!
//! ## Modules
//!
//! - **[`server`]**: Router assembly, health checks, graceful shutdown
//! - **[`http`]**: HTTP middleware (CORS, security headers, request ids)
//! - **[`errors`]**: Typed failures and the error normalizer
//! - **[`extractors`]**: Validating extractors (JSON body, query, ObjectId path)
//! - **[`validation`]**: Request schemas and violation reporting
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_production_app, create_router};
//! use core_config::{Environment, server::ServerConfig};
//! use std::time::Duration;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes, Router::new(), &config, Environment::Development)?;
//!
//!     create_production_app(router, &config, Duration::from_secs(30), async {}).await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;
pub mod validation;

// Re-export server types
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

// Re-export HTTP middleware
pub use http::{create_cors_layer, security_headers};

// Re-export error types
pub use errors::{AppError, ErrorKind, ErrorResponse, FieldError};

// Re-export extractors
#[cfg(feature = "mongodb")]
pub use extractors::ObjectIdPath;
pub use extractors::{ValidatedJson, ValidatedQuery};

// Re-export validation helpers
pub use validation::{Schema, Source};
