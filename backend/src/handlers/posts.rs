use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::{ApiJson, ListQuery, POST_NOT_FOUND, validated};
use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        CreatePostRequest, DataResponse, MessageResponse, Post, RowsResponse, UpdatePostRequest,
        ValidationErrorResponse,
    },
    validation::{parse_id, parse_page},
};

/// list_posts
///
/// [Authenticated Route] Lists every post, active or not, in creation order.
#[utoipa::path(
    get,
    path = "/api/post",
    tag = "posts",
    params(ListQuery),
    responses(
        (status = 200, description = "Posts", body = RowsResponse<Post>),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 422, description = "Invalid page parameter", body = ValidationErrorResponse)
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RowsResponse<Post>>, ApiError> {
    let page = parse_page(query.page.as_deref(), state.config.page_size)?;
    let rows = state.repo.list_posts(page).await?;
    Ok(Json(RowsResponse { rows }))
}

#[utoipa::path(
    get,
    path = "/api/post/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = DataResponse<Post>),
        (status = 422, description = "Post not found.", body = ValidationErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    let id = parse_id(&raw_id, POST_NOT_FOUND)?;
    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND, &raw_id))?;
    Ok(Json(DataResponse { data: post }))
}

/// create_post
///
/// [Authenticated Route] Creates a post authored by the session user.
#[utoipa::path(
    post,
    path = "/api/post",
    tag = "posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Created post", body = DataResponse<Post>),
        (status = 400, description = "Slug already exists", body = MessageResponse),
        (status = 422, description = "Field errors", body = ValidationErrorResponse)
    )
)]
pub async fn create_post(
    AuthUser { id: author, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    let payload = validated(payload)?;
    let post = state.repo.create_post(payload, author).await?;

    tracing::info!(post_id = %post.id, author = %author, "post created");
    Ok(Json(DataResponse { data: post }))
}

#[utoipa::path(
    put,
    path = "/api/post/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated post", body = DataResponse<Post>),
        (status = 400, description = "Slug already exists", body = MessageResponse),
        (status = 422, description = "Post not found. / field errors", body = ValidationErrorResponse)
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    let missing = || ApiError::not_found(POST_NOT_FOUND, &raw_id);
    let id = parse_id(&raw_id, POST_NOT_FOUND)?;
    state.repo.get_post(id).await?.ok_or_else(missing)?;

    let payload = validated(payload)?;
    let post = state
        .repo
        .update_post(id, payload)
        .await?
        .ok_or_else(missing)?;
    Ok(Json(DataResponse { data: post }))
}

#[utoipa::path(
    delete,
    path = "/api/post/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Removed post", body = DataResponse<Post>),
        (status = 422, description = "Post not found.", body = ValidationErrorResponse)
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    let id = parse_id(&raw_id, POST_NOT_FOUND)?;
    let post = state
        .repo
        .delete_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found(POST_NOT_FOUND, &raw_id))?;

    tracing::info!(post_id = %post.id, "post removed");
    Ok(Json(DataResponse { data: post }))
}
