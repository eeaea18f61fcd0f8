//! Routes served outside `/api`

use axum::{Json, Router, routing::get};
use axum_helpers::health_router;
use core_config::AppInfo;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct WelcomeResponse {
    message: &'static str,
}

async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the API",
    })
}

/// `GET /` and `GET /health`
pub fn router(app: AppInfo) -> Router {
    Router::new()
        .route("/", get(welcome))
        .merge(health_router(app))
}
