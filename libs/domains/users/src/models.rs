use axum_helpers::{
    FieldError,
    validation::{Schema, Source, check_length, field_errors, rule, trim},
};
use chrono::{SecondsFormat, Utc};
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::error::{UserError, UserResult};

/// User entity - represents a user document in the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime,
    pub last_modified_at: DateTime,
    /// Present only while the user is soft-deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,
}

impl User {
    pub fn new(input: NewUser, now: DateTime) -> Self {
        Self {
            id: ObjectId::new(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            created_at: now,
            last_modified_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Timestamp for the next mutation: `now`, or one millisecond past the
    /// current `lastModifiedAt` when the clock has not moved on.
    pub fn next_modified_at(&self, now: DateTime) -> DateTime {
        let floor = self.last_modified_at.timestamp_millis() + 1;
        DateTime::from_millis(now.timestamp_millis().max(floor))
    }
}

/// Public representation of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// 24 character hex ObjectId
    #[schema(example = "65a1f0c2e4b0a1b2c3d4e5f6")]
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub last_modified_at: String,
    /// RFC 3339, only while soft-deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: rfc3339(user.created_at),
            last_modified_at: rfc3339(user.last_modified_at),
            deleted_at: user.deleted_at.map(rfc3339),
        }
    }
}

fn rfc3339(value: DateTime) -> String {
    chrono::DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

fn validate_first_name(value: &String) -> Result<(), ValidationError> {
    check_length(value, "First name", 2, 50)
}

fn validate_last_name(value: &String) -> Result<(), ValidationError> {
    check_length(value, "Last name", 2, 50)
}

fn validate_email_length(value: &String) -> Result<(), ValidationError> {
    check_length(value, "Email", 5, 255)
}

/// Request body for `POST /users`
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[serde(default, deserialize_with = "trim::optional")]
    #[validate(
        required(message = "First name is required"),
        custom(function = "validate_first_name")
    )]
    #[schema(example = "Ada", min_length = 2, max_length = 50)]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "trim::optional")]
    #[validate(
        required(message = "Last name is required"),
        custom(function = "validate_last_name")
    )]
    #[schema(example = "Lovelace", min_length = 2, max_length = 50)]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "trim::optional")]
    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format"),
        custom(function = "validate_email_length")
    )]
    #[schema(example = "ada@example.com", min_length = 5, max_length = 255)]
    pub email: Option<String>,
}

impl Schema for CreateUser {
    const FIELDS: &'static [&'static str] = &["firstName", "lastName", "email"];
}

/// Validated fields of a new user
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl TryFrom<CreateUser> for NewUser {
    type Error = UserError;

    fn try_from(input: CreateUser) -> UserResult<Self> {
        input
            .validate()
            .map_err(|e| UserError::Validation(field_errors::<CreateUser>(Source::Body, &e)))?;

        match (input.first_name, input.last_name, input.email) {
            (Some(first_name), Some(last_name), Some(email)) => Ok(Self {
                first_name,
                last_name,
                email,
            }),
            _ => Err(UserError::Validation(vec![FieldError::new(
                Source::Body.as_str(),
                "firstName, lastName and email are required",
            )])),
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

pub const UPDATE_REQUIRES_FIELD: &str =
    "At least one field firsName or lastName must be provided for updating";

fn validate_has_changes(value: &UpdateUser) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rule("update_data", UPDATE_REQUIRES_FIELD));
    }
    Ok(())
}

/// Request body for `PATCH /users/{id}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_has_changes"))]
pub struct UpdateUser {
    #[serde(default, deserialize_with = "trim::optional")]
    #[validate(custom(function = "validate_first_name"))]
    #[schema(example = "Ada", min_length = 2, max_length = 50)]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "trim::optional")]
    #[validate(custom(function = "validate_last_name"))]
    #[schema(example = "Lovelace", min_length = 2, max_length = 50)]
    pub last_name: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }
}

impl Schema for UpdateUser {
    const FIELDS: &'static [&'static str] = &["firstName", "lastName"];
    const REFINEMENT_PATH: Option<&'static str> = Some("updateData");
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Sortable user fields, named as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SortField {
    FirstName,
    LastName,
    Email,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

fn validate_filter_first_name(value: &String) -> Result<(), ValidationError> {
    check_length(value, "First name", 3, 50)
}

fn validate_filter_last_name(value: &String) -> Result<(), ValidationError> {
    check_length(value, "Last name", 3, 50)
}

fn validate_filter_email(value: &String) -> Result<(), ValidationError> {
    check_length(value, "Email", 0, 255)
}

fn parse_limit(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().filter(|n| (1..=100).contains(n))
}

// The driver encodes `skip` as a BSON int64.
fn parse_offset(value: &str) -> Option<u64> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn validate_limit(value: &String) -> Result<(), ValidationError> {
    parse_limit(value)
        .map(|_| ())
        .ok_or_else(|| rule("limit", "limit must be an integer between 1 and 100"))
}

fn validate_offset(value: &String) -> Result<(), ValidationError> {
    parse_offset(value)
        .map(|_| ())
        .ok_or_else(|| rule("offset", "offset must be a non-negative integer"))
}

fn validate_sort_by(value: &String) -> Result<(), ValidationError> {
    SortField::from_str(value)
        .map(|_| ())
        .map_err(|_| rule("sort_by", "sortBy must be one of firstName, lastName, email"))
}

fn validate_sort_order(value: &String) -> Result<(), ValidationError> {
    SortOrder::from_str(value)
        .map(|_| ())
        .map_err(|_| rule("sort_order", "sortOrder must be one of asc, desc"))
}

fn validate_include_deleted(value: &String) -> Result<(), ValidationError> {
    parse_bool(value)
        .map(|_| ())
        .ok_or_else(|| rule("include_deleted", "includeDeleted must be true or false"))
}

/// Query parameters for `GET /users`, as received
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    /// Case-insensitive substring of the first name
    #[serde(default, deserialize_with = "trim::optional_non_blank")]
    #[validate(custom(function = "validate_filter_first_name"))]
    pub first_name: Option<String>,

    /// Case-insensitive substring of the last name
    #[serde(default, deserialize_with = "trim::optional_non_blank")]
    #[validate(custom(function = "validate_filter_last_name"))]
    pub last_name: Option<String>,

    /// Case-insensitive substring of the email
    #[serde(default, deserialize_with = "trim::optional_non_blank")]
    #[validate(custom(function = "validate_filter_email"))]
    pub email: Option<String>,

    /// Page size, 1 to 100
    #[serde(default, deserialize_with = "trim::optional_non_blank")]
    #[validate(custom(function = "validate_limit"))]
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,

    /// Number of users to skip
    #[serde(default, deserialize_with = "trim::optional_non_blank")]
    #[validate(custom(function = "validate_offset"))]
    #[param(value_type = Option<u64>)]
    pub offset: Option<String>,

    #[serde(default, deserialize_with = "trim::optional_non_blank")]
    #[validate(custom(function = "validate_sort_by"))]
    #[param(value_type = Option<SortField>)]
    pub sort_by: Option<String>,

    /// Defaults to `asc` when `sortBy` is given
    #[serde(default, deserialize_with = "trim::optional_non_blank")]
    #[validate(custom(function = "validate_sort_order"))]
    #[param(value_type = Option<SortOrder>)]
    pub sort_order: Option<String>,

    /// Include soft-deleted users
    #[serde(default, deserialize_with = "trim::optional_non_blank")]
    #[validate(custom(function = "validate_include_deleted"))]
    #[param(value_type = Option<bool>)]
    pub include_deleted: Option<String>,
}

impl Schema for UserFilter {
    const FIELDS: &'static [&'static str] = &[
        "firstName",
        "lastName",
        "email",
        "limit",
        "offset",
        "sortBy",
        "sortOrder",
        "includeDeleted",
    ];
}

/// Typed listing criteria handed to the repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
    pub sort: Option<(SortField, SortOrder)>,
    pub include_deleted: bool,
}

impl TryFrom<UserFilter> for UserQuery {
    type Error = UserError;

    fn try_from(filter: UserFilter) -> UserResult<Self> {
        filter
            .validate()
            .map_err(|e| UserError::Validation(field_errors::<UserFilter>(Source::Query, &e)))?;

        let sort_order = filter
            .sort_order
            .as_deref()
            .and_then(|s| SortOrder::from_str(s).ok())
            .unwrap_or_default();
        let sort = filter
            .sort_by
            .as_deref()
            .and_then(|s| SortField::from_str(s).ok())
            .map(|field| (field, sort_order));

        Ok(Self {
            first_name: filter.first_name,
            last_name: filter.last_name,
            email: filter.email,
            limit: filter.limit.as_deref().and_then(parse_limit),
            offset: filter.offset.as_deref().and_then(parse_offset),
            sort,
            include_deleted: filter
                .include_deleted
                .as_deref()
                .and_then(parse_bool)
                .unwrap_or(false),
        })
    }
}
