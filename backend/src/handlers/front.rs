use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;

use super::POST_NOT_FOUND;
use crate::{
    AppState,
    error::ApiError,
    models::{DataResponse, FieldError, Post, RowsResponse, ValidationErrorResponse},
};

/// get_latest_posts
///
/// [Public Route] The newest active posts for the site's front page.
#[utoipa::path(
    get,
    path = "/api/get/post/latest",
    tag = "front",
    responses((status = 200, description = "Latest active posts, newest first", body = RowsResponse<Post>))
)]
pub async fn get_latest_posts(
    State(state): State<AppState>,
) -> Result<Json<RowsResponse<Post>>, ApiError> {
    let rows = state
        .repo
        .get_latest_posts(state.config.latest_posts_limit)
        .await?;
    Ok(Json(RowsResponse { rows }))
}

/// get_post_by_slug
///
/// [Public Route] A single active post. Inactive posts are indistinguishable from
/// missing ones.
#[utoipa::path(
    get,
    path = "/api/get/post/{slug}",
    tag = "front",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post", body = DataResponse<Post>),
        (status = 422, description = "Post not found.", body = ValidationErrorResponse)
    )
)]
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    let post = state
        .repo
        .get_active_post_by_slug(&slug)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(vec![FieldError {
                location: "params".to_string(),
                param: "slug".to_string(),
                msg: POST_NOT_FOUND.to_string(),
                value: Value::String(slug.clone()),
            }])
        })?;
    Ok(Json(DataResponse { data: post }))
}
