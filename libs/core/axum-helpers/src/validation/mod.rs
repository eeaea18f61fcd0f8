//! Request schemas and violation reporting.
//!
//! A schema is a `Deserialize + Validate` type that also lists its wire
//! field names through [`Schema::FIELDS`]. `validator` keeps violations in
//! a hash map, so the list is what gives the report a stable order:
//! violations come out field by field in `FIELDS` order, then struct-level
//! refinements, each prefixed with the request part they came from
//! (`body.email`, `query.limit`, `params.id`).

pub mod trim;

use std::borrow::Cow;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::errors::{AppError, FieldError};

/// Message used when a request cannot be read at all.
pub const INVALID_REQUEST: &str = "Invalid request";

/// Key `validator` files struct-level errors under.
const STRUCT_LEVEL_KEY: &str = "__all__";

/// A request schema.
pub trait Schema: DeserializeOwned + Validate {
    /// Wire names of the fields, in evaluation order.
    const FIELDS: &'static [&'static str];

    /// Path suffix for struct-level refinements. `None` reports them at the
    /// request part itself (`body`).
    const REFINEMENT_PATH: Option<&'static str> = None;
}

/// Part of the request a value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Body,
    Query,
    Params,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Body => "body",
            Source::Query => "query",
            Source::Params => "params",
        }
    }

    /// `body` + `email` -> `body.email`
    pub fn path(&self, field: &str) -> String {
        format!("{}.{}", self.as_str(), field)
    }
}

/// Run `value`'s rules and turn any violations into a validation error.
pub fn validate_schema<T: Schema>(source: Source, value: T) -> Result<T, AppError> {
    match value.validate() {
        Ok(()) => Ok(value),
        Err(errors) => Err(AppError::validation(field_errors::<T>(source, &errors))),
    }
}

/// Flatten `validator` output into ordered [`FieldError`]s.
pub fn field_errors<T: Schema>(source: Source, errors: &ValidationErrors) -> Vec<FieldError> {
    let mut by_field: HashMap<String, &[ValidationError]> = errors
        .errors()
        .iter()
        .filter_map(|(key, kind)| match kind {
            ValidationErrorsKind::Field(list) => Some((camel_case(key), list.as_slice())),
            _ => None,
        })
        .collect();

    let mut detail = Vec::new();
    for field in T::FIELDS {
        if let Some(list) = by_field.remove(*field) {
            push_all(&mut detail, source.path(field), field, list);
        }
    }

    if let Some(list) = by_field.remove(STRUCT_LEVEL_KEY) {
        let path = match T::REFINEMENT_PATH {
            Some(suffix) => source.path(suffix),
            None => source.as_str().to_string(),
        };
        push_all(&mut detail, path, source.as_str(), list);
    }

    // Fields missing from FIELDS still get reported, in a stable order.
    let mut rest: Vec<_> = by_field.into_iter().collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    for (field, list) in rest {
        push_all(&mut detail, source.path(&field), &field, list);
    }

    detail
}

fn push_all(detail: &mut Vec<FieldError>, path: String, field: &str, list: &[ValidationError]) {
    for error in list {
        detail.push(FieldError::new(path.clone(), message_for(field, error)));
    }
}

fn message_for(field: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("{field} is invalid ({})", error.code),
    }
}

/// `first_name` -> `firstName`; camelCase input is returned unchanged.
pub fn camel_case(key: &str) -> String {
    if key == STRUCT_LEVEL_KEY {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Build a `validator` error with a fixed message.
pub fn rule(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Check a character count against inclusive bounds, with the messages
/// `"<label> must be at least <min> characters"` and
/// `"<label> must not exceed <max> characters"`.
pub fn check_length(value: &str, label: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let count = value.chars().count();
    if count < min {
        Err(rule(
            "length",
            format!("{label} must be at least {min} characters"),
        ))
    } else if count > max {
        Err(rule(
            "length",
            format!("{label} must not exceed {max} characters"),
        ))
    } else {
        Ok(())
    }
}

/// Merge the outcomes of two extractors.
///
/// Both validation failures are reported together, first `a`'s then `b`'s.
/// Any other failure wins over validation, `a` before `b`.
pub fn collect<A, B>(a: Result<A, AppError>, b: Result<B, AppError>) -> Result<(A, B), AppError> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (
            Err(AppError::Validation { message, mut detail }),
            Err(AppError::Validation { detail: more, .. }),
        ) => {
            detail.extend(more);
            Err(AppError::Validation { message, detail })
        }
        (Err(AppError::Validation { .. }), Err(other)) => Err(other),
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}
