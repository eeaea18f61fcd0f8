//! Server infrastructure: router assembly, health endpoints and graceful
//! shutdown.
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::app_info;
//!
//! let root = Router::new().merge(health_router(app_info!()));
//! let router = create_router::<ApiDoc>(api_routes, root, &config.server, config.environment)?;
//! create_production_app(router, &config.server, Duration::from_secs(30), async {}).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
