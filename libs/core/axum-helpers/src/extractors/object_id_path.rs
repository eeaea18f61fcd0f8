//! ObjectId path parameter extractor.

use crate::errors::{AppError, FieldError};
use crate::validation::{INVALID_REQUEST, Source};
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use mongodb::bson::oid::ObjectId;

/// First path parameter parsed as a MongoDB `ObjectId`.
///
/// A malformed value is a validation failure naming the parameter:
///
/// ```json
/// { "path": "params.id", "message": "Invalid id format, must be a 24 character hex string" }
/// ```
///
/// ```ignore
/// async fn get_user(ObjectIdPath(id): ObjectIdPath) -> String {
///     id.to_hex()
/// }
///
/// let app = Router::new().route("/users/{id}", get(get_user));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectIdPath(pub ObjectId);

impl<S> FromRequestParts<S> for ObjectIdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(%rejection, "Failed to read path parameters");
                AppError::BadRequest(INVALID_REQUEST.to_string())
            })?;

        let (name, raw) = params
            .into_iter()
            .next()
            .ok_or_else(|| AppError::BadRequest(INVALID_REQUEST.to_string()))?;

        parse_object_id(&name, &raw).map(ObjectIdPath)
    }
}

/// Parse `raw` as an ObjectId, reporting failures against parameter `name`.
pub fn parse_object_id(name: &str, raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| {
        AppError::validation(vec![FieldError::new(
            Source::Params.path(name),
            format!("Invalid {name} format, must be a 24 character hex string"),
        )])
    })
}
