//! Readiness endpoint

use axum::{Router, extract::State, response::Response, routing::get};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// 200 when MongoDB answers a ping, 503 otherwise
async fn readiness_check(State(state): State<AppState>) -> Response {
    let client = state.mongo_client.clone();
    let mongo: HealthCheckFuture = Box::pin(async move {
        let status = database::mongodb::check_health_detailed(&client).await;
        tracing::debug!(response_time_ms = status.response_time_ms, "MongoDB ping");
        if status.healthy {
            Ok(())
        } else {
            Err(status.message.unwrap_or_else(|| "ping failed".to_string()))
        }
    });

    run_health_checks(vec![("database", mongo)]).await
}
