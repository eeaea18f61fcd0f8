use mongodb::Client;
use serde::Serialize;
use std::time::Instant;

use super::connector::ping;

/// Outcome of a MongoDB ping
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// `true` when the server answers a ping.
pub async fn check_health(client: &Client) -> bool {
    ping(client).await.is_ok()
}

/// Ping with latency and the driver's error message on failure.
pub async fn check_health_detailed(client: &Client) -> HealthStatus {
    let start = Instant::now();
    let outcome = ping(client).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(()) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms,
        },
    }
}
