use axum_helpers::{AppError, FieldError};
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// MongoDB server code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("User not valid for recovery")]
    NotRestorable,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Invalid input")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),
}

pub type UserResult<T> = Result<T, UserError>;

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound | UserError::NotRestorable => AppError::NotFound(err.to_string()),
            UserError::DuplicateEmail => AppError::Conflict(err.to_string()),
            UserError::Validation(detail) => AppError::validation(detail),
            UserError::Database(cause) => AppError::internal_from(cause),
        }
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            UserError::DuplicateEmail
        } else {
            UserError::Database(err.to_string())
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}
