use super::shutdown::ShutdownCoordinator;
use crate::errors::{handlers::not_found, with_error_normalizer};
use crate::http::{MakeRequestUuidV7, REQUEST_ID_HEADER, create_cors_layer, request_span, security_headers};
use axum::{Router, body::Body, middleware};
use core_config::{Environment, server::ServerConfig};
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Assemble the full application router.
///
/// - API routes nested under `/api`, `root` routes merged at `/`
/// - OpenAPI document at `/api-docs/openapi.json` with Swagger UI, ReDoc,
///   RapiDoc and Scalar viewers
/// - 404 fallback
/// - panic recovery and the error normalizer around all of the above
/// - security headers, request ids, request tracing, compression
/// - CORS when `server_config.cors_allowed_origins` is non-empty
///
/// # Errors
/// Returns `InvalidInput` when a configured CORS origin is malformed.
pub fn create_router<T>(
    apis: Router,
    root: Router,
    server_config: &ServerConfig,
    environment: Environment,
) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};
    use utoipa_swagger_ui::SwaggerUi;

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .merge(root)
        .nest("/api", apis)
        .fallback(not_found);

    let router = with_error_normalizer(router, environment)
        .layer(middleware::from_fn(security_headers))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span::<Body>)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuidV7))
        .layer(CompressionLayer::new());

    match create_cors_layer(&server_config.cors_allowed_origins)? {
        Some(cors) => {
            info!(origins = ?server_config.cors_allowed_origins, "CORS enabled");
            Ok(router.layer(cors))
        }
        None => Ok(router),
    }
}

/// Serve with coordinated shutdown.
///
/// After a shutdown signal, in-flight requests are drained and `cleanup`
/// runs with at most `shutdown_timeout` to finish.
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::new();
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let signal_handle = coordinator.clone();
    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { signal_handle.wait_for_signal().await })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed successfully"),
        Err(_) => tracing::warn!(
            "Cleanup exceeded timeout of {:?}, forcing shutdown",
            shutdown_timeout
        ),
    }

    serve_result
}
