//! JSON body extractor with schema validation.

use crate::errors::{AppError, FieldError};
use crate::validation::{INVALID_REQUEST, Schema, Source, field_errors, validate_schema};
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};
use validator::Validate;

/// JSON body validated against a [`Schema`].
///
/// An empty body is checked as `{}`, so missing required fields show up as
/// violations rather than a parse failure.
///
/// ```ignore
/// async fn create_user(ValidatedJson(input): ValidatedJson<CreateUser>) -> impl IntoResponse {
///     // input is trimmed and valid here
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Schema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(%rejection, "Failed to read request body");
            AppError::BadRequest(INVALID_REQUEST.to_string())
        })?;

        parse_body(&bytes).map(ValidatedJson)
    }
}

/// Parse and validate a raw body.
pub fn parse_body<T: Schema>(bytes: &[u8]) -> Result<T, AppError> {
    let value = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice::<Value>(bytes).map_err(|e| {
            tracing::debug!(error = %e, "Request body is not valid JSON");
            AppError::BadRequest(INVALID_REQUEST.to_string())
        })?
    };

    let Value::Object(object) = value else {
        return Err(AppError::BadRequest(INVALID_REQUEST.to_string()));
    };

    match serde_json::from_value::<T>(Value::Object(object.clone())) {
        Ok(parsed) => validate_schema(Source::Body, parsed),
        Err(e) => Err(type_errors::<T>(object, e)),
    }
}

/// Each wrongly typed field is reported at its own path, together with the
/// rule violations of the fields that did deserialize. Struct-level
/// refinements are skipped, as they are whenever a field fails.
fn type_errors<T: Schema>(mut object: Map<String, Value>, error: serde_json::Error) -> AppError {
    let body = Source::Body;
    let mut detail = Vec::new();
    let mut mistyped = Vec::new();

    for field in T::FIELDS {
        let Some(value) = object.get(*field) else {
            continue;
        };
        let single = Map::from_iter([(field.to_string(), value.clone())]);
        if let Err(e) = serde_json::from_value::<T>(Value::Object(single)) {
            detail.push(FieldError::new(body.path(field), e.to_string()));
            mistyped.push(body.path(field));
        }
    }

    if detail.is_empty() {
        return AppError::validation(vec![FieldError::new(body.as_str(), error.to_string())]);
    }

    for field in T::FIELDS {
        if mistyped.contains(&body.path(field)) {
            object.remove(*field);
        }
    }

    let rest = serde_json::from_value::<T>(Value::Object(object)).ok();
    if let Some(Err(errors)) = rest.map(|rest| rest.validate()) {
        detail.extend(
            field_errors::<T>(body, &errors)
                .into_iter()
                .filter(|e| !mistyped.contains(&e.path))
                .filter(|e| T::FIELDS.iter().any(|f| e.path == body.path(f))),
        );
    }

    detail.sort_by_key(|e| {
        T::FIELDS
            .iter()
            .position(|f| e.path == body.path(f))
            .unwrap_or(usize::MAX)
    });
    AppError::validation(detail)
}
