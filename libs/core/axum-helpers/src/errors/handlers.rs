use super::AppError;

/// Router fallback for unmatched paths.
pub async fn not_found() -> AppError {
    AppError::not_found()
}
