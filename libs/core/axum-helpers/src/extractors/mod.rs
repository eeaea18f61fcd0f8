//! Extractors that run the validation gate.
//!
//! Each rejects with an [`AppError`](crate::errors::AppError): schema
//! violations become `Validation` with every violation listed, anything
//! unreadable becomes `BadRequest("Invalid request")`. Handlers that take
//! more than one of them can accept `Result<_, AppError>` arguments and
//! combine them with [`crate::validation::collect`] so all violations are
//! reported at once.

#[cfg(feature = "mongodb")]
pub mod object_id_path;
pub mod validated_json;
pub mod validated_query;

#[cfg(feature = "mongodb")]
pub use object_id_path::ObjectIdPath;
pub use validated_json::ValidatedJson;
pub use validated_query::ValidatedQuery;
