//! Error kinds for API failures.
//!
//! Each kind fixes the HTTP status, the name reported to clients in
//! development, and the message used when the raiser supplies none.
//!
//! ```rust
//! use axum_helpers::errors::ErrorKind;
//! use axum::http::StatusCode;
//!
//! let kind = ErrorKind::NotFound;
//! assert_eq!(kind.status(), StatusCode::NOT_FOUND);
//! assert_eq!(kind.name(), "NotFoundError");
//! assert_eq!(kind.default_message(), "Resource not found");
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Name reported for failures that did not come from an [`ErrorKind`],
/// such as the router's own 405 responses.
pub const GENERIC_ERROR_NAME: &str = "HttpError";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ErrorKind {
    /// Malformed request that no schema could describe
    BadRequest,
    Unauthorized,
    NotFound,
    /// Request conflicts with stored state, e.g. a duplicate unique key
    Conflict,
    /// Schema violations; always carries field detail
    Validation,
    /// Anything unexpected
    Internal,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        Self::BadRequest,
        Self::Unauthorized,
        Self::NotFound,
        Self::Conflict,
        Self::Validation,
        Self::Internal,
    ];

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Name exposed in the `error` field of development responses.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequestError",
            Self::Unauthorized => "UnauthorizedError",
            Self::NotFound => "NotFoundError",
            Self::Conflict => "ConflictError",
            Self::Validation => "ValidationError",
            Self::Internal => "InternalServerError",
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad request",
            Self::Unauthorized => "Unauthorized",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Conflict",
            Self::Validation => "Validation",
            Self::Internal => "Internal server error",
        }
    }

    /// Kind whose status is exactly `status`, if any.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.status() == status)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
