//! Query string extractor with schema validation.

use crate::errors::AppError;
use crate::validation::{INVALID_REQUEST, Schema, Source, validate_schema};
use axum::{
    extract::{FromRequestParts, Query},
    http::{Uri, request::Parts},
};

/// Query parameters validated against a [`Schema`].
///
/// Values arrive as strings; numeric coercion and range checks belong to
/// the schema's rules.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: Schema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_query(&parts.uri).map(ValidatedQuery)
    }
}

/// Parse and validate the query string of `uri`.
pub fn parse_query<T: Schema>(uri: &Uri) -> Result<T, AppError> {
    let Query(value) = Query::<T>::try_from_uri(uri).map_err(|rejection| {
        tracing::debug!(%rejection, "Failed to parse query string");
        AppError::BadRequest(INVALID_REQUEST.to_string())
    })?;

    validate_schema(Source::Query, value)
}
