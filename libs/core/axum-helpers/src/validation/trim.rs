//! Serde helpers that trim surrounding whitespace before validation runs.
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct CreateUser {
//!     #[serde(default, deserialize_with = "trim::optional")]
//!     first_name: Option<String>,
//! }
//! ```

use serde::{Deserialize, Deserializer};

/// Trimmed `Option<String>`. Pair with `#[serde(default)]` so a missing
/// field stays `None` and reaches the `required` rule.
pub fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()))
}

/// Trimmed `Option<String>` where a blank value counts as absent.
///
/// Used for query filters, where `?firstName=` means "no filter".
pub fn optional_non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional(deserializer)?.filter(|s| !s.is_empty()))
}
