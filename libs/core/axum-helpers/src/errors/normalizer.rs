//! Terminal failure formatter.
//!
//! Every response leaving the router passes through [`normalize_errors`].
//! Successful responses are untouched. A failure response (one carrying an
//! [`ErrorReport`], or any 4xx/5xx produced elsewhere) is logged once and
//! rewritten into an [`ErrorResponse`] body. The diagnostic `error` and
//! `stack` fields are only serialized outside production.

use axum::{
    Json, Router,
    extract::{Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use core_config::Environment;
use serde::{Deserialize, Serialize};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::ToSchema;

use super::{AppError, ErrorReport, FieldError};

/// Failure envelope.
///
/// ```json
/// {
///   "success": false,
///   "message": "Validation",
///   "detail": [{ "path": "body.email", "message": "Invalid email format" }],
///   "error": "ValidationError",
///   "stack": "ValidationError: Validation\n ..."
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    /// Field violations, validation failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Vec<FieldError>>,
    /// Error kind name, development only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Diagnostic trace, development only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorResponse {
    pub fn from_report(report: &ErrorReport, environment: Environment) -> Self {
        let verbose = !environment.is_production();
        Self {
            success: false,
            message: report.message.clone(),
            detail: report.detail.clone(),
            error: verbose.then(|| report.name.to_string()),
            stack: verbose.then(|| report.stack()),
        }
    }
}

/// Marks a failure response that is already in its final form.
///
/// The normalizer sets it on everything it writes. Handlers may set it on
/// deliberate non-2xx payloads, such as a failing readiness report.
#[derive(Debug, Clone, Copy)]
pub struct Normalized;

/// Middleware entry point, installed with
/// `axum::middleware::from_fn_with_state(environment, normalize_errors)`.
pub async fn normalize_errors(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    normalize(environment, response)
}

/// Rewrite `response` into the failure envelope when it is a failure.
pub fn normalize(environment: Environment, mut response: Response) -> Response {
    if response.extensions().get::<Normalized>().is_some() {
        return response;
    }

    let report = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => report,
        None if response.status().is_client_error() || response.status().is_server_error() => {
            ErrorReport::from_status(response.status())
        }
        None => return response,
    };

    log_failure(&report, environment);

    let (parts, _body) = response.into_parts();
    let mut normalized = (
        report.status,
        Json(ErrorResponse::from_report(&report, environment)),
    )
        .into_response();

    for (name, value) in parts.headers.iter() {
        if name != CONTENT_TYPE && name != CONTENT_LENGTH {
            normalized.headers_mut().append(name.clone(), value.clone());
        }
    }
    normalized.extensions_mut().extend(parts.extensions);
    normalized.extensions_mut().insert(Normalized);
    normalized
}

fn log_failure(report: &ErrorReport, environment: Environment) {
    let status = report.status.as_u16();
    match (report.status.is_server_error(), environment.is_production()) {
        (true, true) => tracing::error!(
            status,
            error.kind = report.name,
            error.cause = report.cause.as_deref(),
            "{}: {}",
            report.name,
            report.message
        ),
        (true, false) => tracing::error!(
            status,
            error.kind = report.name,
            stack = %report.stack(),
            "{}: {}",
            report.name,
            report.message
        ),
        (false, true) => tracing::warn!(
            status,
            error.kind = report.name,
            "{}: {}",
            report.name,
            report.message
        ),
        (false, false) => tracing::warn!(
            status,
            error.kind = report.name,
            stack = %report.stack(),
            "{}: {}",
            report.name,
            report.message
        ),
    }
}

/// Converts a caught panic into an internal error report.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let cause = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "panic with a non-string payload".to_string()
    };

    AppError::internal_from(format!("handler panicked: {cause}")).into_response()
}

/// Wrap `router` with panic recovery and the error normalizer.
///
/// Every route, fallback and nested service added before this call has its
/// failures formatted; layers added after it do not.
pub fn with_error_normalizer<S>(router: Router<S>, environment: Environment) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(environment, normalize_errors))
}
