//! Reusable OpenAPI response types for the failure envelope.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Malformed request",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Invalid request"
    })
)]
pub struct BadRequestResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Request failed schema validation",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Validation",
        "detail": [
            { "path": "body.email", "message": "Invalid email format" },
            { "path": "params.id", "message": "Invalid id format, must be a 24 character hex string" }
        ]
    })
)]
pub struct ValidationErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Resource not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflicts with an existing resource",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Conflict"
    })
)]
pub struct ConflictResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "success": false,
        "message": "Internal server error",
        "error": "InternalServerError",
        "stack": "InternalServerError: Internal server error"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);
