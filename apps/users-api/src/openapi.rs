//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users API",
        version = "0.1.0",
        description = "MongoDB-backed REST API for managing users with soft delete",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/users", api = domain_users::ApiDoc)
    ),
    tags(
        (name = "Users", description = "User management endpoints (MongoDB, soft delete)")
    )
)]
pub struct ApiDoc;
