//! Typed API failures and their route to the client.
//!
//! Handlers, extractors and services raise [`AppError`]. Turning one into a
//! response only records an [`ErrorReport`] in the response extensions;
//! [`normalizer::normalize_errors`] is the one place that writes failure
//! bodies and logs them.

pub mod codes;
pub mod handlers;
pub mod normalizer;
pub mod responses;

pub use codes::{ErrorKind, GENERIC_ERROR_NAME};
pub use normalizer::{ErrorResponse, Normalized, normalize_errors, with_error_normalizer};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_error::{SpanTrace, SpanTraceStatus};
use utoipa::ToSchema;

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// Dotted path such as `body.email` or `params.id`
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Application error raised anywhere in request handling.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Validation {
        message: String,
        detail: Vec<FieldError>,
    },

    /// `cause` is logged and shown in development stacks, never in `message`.
    #[error("{message}")]
    Internal {
        message: String,
        cause: Option<String>,
    },
}

impl AppError {
    pub fn bad_request() -> Self {
        Self::BadRequest(ErrorKind::BadRequest.default_message().to_string())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized(ErrorKind::Unauthorized.default_message().to_string())
    }

    pub fn not_found() -> Self {
        Self::NotFound(ErrorKind::NotFound.default_message().to_string())
    }

    pub fn conflict() -> Self {
        Self::Conflict(ErrorKind::Conflict.default_message().to_string())
    }

    pub fn validation(detail: Vec<FieldError>) -> Self {
        Self::Validation {
            message: ErrorKind::Validation.default_message().to_string(),
            detail,
        }
    }

    pub fn internal() -> Self {
        Self::Internal {
            message: ErrorKind::Internal.default_message().to_string(),
            cause: None,
        }
    }

    /// Internal error with the default message, keeping `cause` for logs.
    pub fn internal_from(cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: ErrorKind::Internal.default_message().to_string(),
            cause: Some(cause.to_string()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    pub fn detail(&self) -> Option<&[FieldError]> {
        match self {
            Self::Validation { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Everything the normalizer needs to describe a failure.
///
/// Travels from the raise site to [`normalizer::normalize_errors`] inside
/// the response extensions.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub name: &'static str,
    pub message: String,
    pub detail: Option<Vec<FieldError>>,
    pub cause: Option<String>,
    pub trace: SpanTrace,
}

impl ErrorReport {
    /// Report for a failure response that carries no [`AppError`].
    pub fn from_status(status: StatusCode) -> Self {
        let (name, message) = match ErrorKind::from_status(status) {
            Some(kind) => (kind.name(), kind.default_message().to_string()),
            None => (
                GENERIC_ERROR_NAME,
                status.canonical_reason().unwrap_or("Unknown error").to_string(),
            ),
        };

        Self {
            status,
            name,
            message,
            detail: None,
            cause: None,
            trace: SpanTrace::capture(),
        }
    }

    /// `"<Name>: <message>"`, the cause if any, then the captured span trace.
    pub fn stack(&self) -> String {
        let mut stack = format!("{}: {}", self.name, self.message);
        if let Some(cause) = &self.cause {
            stack.push_str("\n    caused by: ");
            stack.push_str(cause);
        }
        if self.trace.status() == SpanTraceStatus::CAPTURED {
            stack.push('\n');
            stack.push_str(&self.trace.to_string());
        }
        stack
    }
}

impl From<AppError> for ErrorReport {
    fn from(error: AppError) -> Self {
        let kind = error.kind();
        let (message, detail, cause) = match error {
            AppError::Validation { message, detail } => (message, Some(detail), None),
            AppError::Internal { message, cause } => (message, None, cause),
            AppError::BadRequest(message)
            | AppError::Unauthorized(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message) => (message, None, None),
        };

        Self {
            status: kind.status(),
            name: kind.name(),
            message,
            detail,
            cause,
            trace: SpanTrace::capture(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from(self);
        let mut response = report.status.into_response();
        response.extensions_mut().insert(report);
        response
    }
}
