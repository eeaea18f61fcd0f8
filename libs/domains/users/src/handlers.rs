use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use axum_helpers::{
    AppError, ObjectIdPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestResponse, ConflictResponse, InternalServerErrorResponse, NotFoundResponse,
        ValidationErrorResponse,
    },
    validation::collect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::models::{CreateUser, NewUser, SortField, SortOrder, UpdateUser, UserFilter, UserQuery, UserView};
use crate::repository::UserRepository;
use crate::service::UserService;

/// `{ "success": true, "data": {...} }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub data: UserView,
}

impl UserResponse {
    fn new(data: impl Into<UserView>) -> Self {
        Self {
            success: true,
            data: data.into(),
        }
    }
}

/// `{ "success": true, "data": [...], "count": N }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub success: bool,
    pub data: Vec<UserView>,
    /// Number of users in `data`
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
        restore_user,
    ),
    components(
        schemas(
            UserView,
            CreateUser,
            UpdateUser,
            SortField,
            SortOrder,
            UserResponse,
            UserListResponse,
            SuccessResponse
        ),
        responses(
            BadRequestResponse,
            ValidationErrorResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "User management endpoints (MongoDB, soft delete)")
    )
)]
pub struct ApiDoc;

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/{id}/restore", patch(restore_user))
        .with_state(shared_service)
}

/// List users with optional filters, sorting and pagination
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(UserFilter),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedQuery(filter): ValidatedQuery<UserFilter>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = service.list_users(UserQuery::try_from(filter)?).await?;
    let data: Vec<UserView> = users.into_iter().map(UserView::from).collect();

    Ok(Json(UserListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = service.create_user(NewUser::try_from(input)?).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::new(user))))
}

/// Get a user by ID, soft-deleted users included
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24 character hex ObjectId)")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Json<UserResponse>, AppError> {
    let user = service.get_user(id).await?;
    Ok(Json(UserResponse::new(user)))
}

/// Update a user's names
///
/// Violations in the id and the body are reported together.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24 character hex ObjectId)")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    id: Result<ObjectIdPath, AppError>,
    input: Result<ValidatedJson<UpdateUser>, AppError>,
) -> Result<Json<UserResponse>, AppError> {
    let (ObjectIdPath(id), ValidatedJson(input)) = collect(id, input)?;
    let user = service.update_user(id, input).await?;
    Ok(Json(UserResponse::new(user)))
}

/// Soft-delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24 character hex ObjectId)")
    ),
    responses(
        (status = 200, description = "User deleted", body = SuccessResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Json<SuccessResponse>, AppError> {
    service.delete_user(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Restore a soft-deleted user
#[utoipa::path(
    patch,
    path = "/{id}/restore",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24 character hex ObjectId)")
    ),
    responses(
        (status = 200, description = "User restored", body = UserResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn restore_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Json<UserResponse>, AppError> {
    let user = service.restore_user(id).await?;
    Ok(Json(UserResponse::new(user)))
}
