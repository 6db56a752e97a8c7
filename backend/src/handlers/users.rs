use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::{ApiJson, ListQuery, USER_NOT_FOUND, validated};
use crate::{
    AppState,
    auth::hash_password,
    error::ApiError,
    models::{
        CreateUserRequest, DataResponse, MessageResponse, NewUser, RowsResponse,
        UpdateUserRequest, User, ValidationErrorResponse,
    },
    validation::{parse_id, parse_page},
};

/// list_users
///
/// [Authenticated Route] Lists back-office accounts in creation order.
#[utoipa::path(
    get,
    path = "/api/user",
    tag = "users",
    params(ListQuery),
    responses(
        (status = 200, description = "Users", body = RowsResponse<User>),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 422, description = "Invalid page parameter", body = ValidationErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RowsResponse<User>>, ApiError> {
    let page = parse_page(query.page.as_deref(), state.config.page_size)?;
    let rows = state.repo.list_users(page).await?;
    Ok(Json(RowsResponse { rows }))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = DataResponse<User>),
        (status = 422, description = "User not found.", body = ValidationErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let id = parse_id(&raw_id, USER_NOT_FOUND)?;
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND, &raw_id))?;
    Ok(Json(DataResponse { data: user }))
}

/// create_user
///
/// [Authenticated Route] Creates an account. The password is hashed with Argon2 before it
/// reaches the store and is never returned.
#[utoipa::path(
    post,
    path = "/api/user",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Created user", body = DataResponse<User>),
        (status = 400, description = "Email or username already exists", body = MessageResponse),
        (status = 422, description = "Field errors", body = ValidationErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let payload = validated(payload)?;
    let password_hash = hash_password(&payload.password)?;
    let user = state
        .repo
        .create_user(NewUser {
            email: payload.email,
            username: payload.username,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "user created");
    Ok(Json(DataResponse { data: user }))
}

/// update_user
///
/// [Authenticated Route] Changes the supplied `email` and/or `username`.
#[utoipa::path(
    put,
    path = "/api/user/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = DataResponse<User>),
        (status = 400, description = "Email or username already exists", body = MessageResponse),
        (status = 422, description = "User not found. / field errors", body = ValidationErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let missing = || ApiError::not_found(USER_NOT_FOUND, &raw_id);
    let id = parse_id(&raw_id, USER_NOT_FOUND)?;
    state.repo.get_user(id).await?.ok_or_else(missing)?;

    let payload = validated(payload)?;
    let user = state
        .repo
        .update_user(id, payload)
        .await?
        .ok_or_else(missing)?;
    Ok(Json(DataResponse { data: user }))
}

#[utoipa::path(
    delete,
    path = "/api/user/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Removed user", body = DataResponse<User>),
        (status = 422, description = "User not found.", body = ValidationErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<User>>, ApiError> {
    let id = parse_id(&raw_id, USER_NOT_FOUND)?;
    let user = state
        .repo
        .delete_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND, &raw_id))?;

    tracing::info!(user_id = %user.id, "user removed");
    Ok(Json(DataResponse { data: user }))
}
