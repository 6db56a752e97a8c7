use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::{ApiJson, CATEGORY_NOT_FOUND, ListQuery, validated};
use crate::{
    AppState,
    error::ApiError,
    models::{
        Category, CreateCategoryRequest, DataResponse, MessageResponse, RowsResponse,
        UpdateCategoryRequest, ValidationErrorResponse,
    },
    validation::{parse_id, parse_page},
};

#[utoipa::path(
    get,
    path = "/api/category",
    tag = "categories",
    params(ListQuery),
    responses(
        (status = 200, description = "Categories", body = RowsResponse<Category>),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 422, description = "Invalid page parameter", body = ValidationErrorResponse)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RowsResponse<Category>>, ApiError> {
    let page = parse_page(query.page.as_deref(), state.config.page_size)?;
    let rows = state.repo.list_categories(page).await?;
    Ok(Json(RowsResponse { rows }))
}

#[utoipa::path(
    get,
    path = "/api/category/{id}",
    tag = "categories",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = DataResponse<Category>),
        (status = 422, description = "Category not found.", body = ValidationErrorResponse)
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    let id = parse_id(&raw_id, CATEGORY_NOT_FOUND)?;
    let category = state
        .repo
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND, &raw_id))?;
    Ok(Json(DataResponse { data: category }))
}

#[utoipa::path(
    post,
    path = "/api/category",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Created category", body = DataResponse<Category>),
        (status = 400, description = "Name already exists", body = MessageResponse),
        (status = 422, description = "Field errors", body = ValidationErrorResponse)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCategoryRequest>,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    let payload = validated(payload)?;
    let category = state.repo.create_category(payload).await?;
    Ok(Json(DataResponse { data: category }))
}

#[utoipa::path(
    put,
    path = "/api/category/{id}",
    tag = "categories",
    params(("id" = String, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated category", body = DataResponse<Category>),
        (status = 400, description = "Name already exists", body = MessageResponse),
        (status = 422, description = "Category not found. / field errors", body = ValidationErrorResponse)
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateCategoryRequest>,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    let missing = || ApiError::not_found(CATEGORY_NOT_FOUND, &raw_id);
    let id = parse_id(&raw_id, CATEGORY_NOT_FOUND)?;
    state.repo.get_category(id).await?.ok_or_else(missing)?;

    let payload = validated(payload)?;
    let category = state
        .repo
        .update_category(id, payload)
        .await?
        .ok_or_else(missing)?;
    Ok(Json(DataResponse { data: category }))
}

#[utoipa::path(
    delete,
    path = "/api/category/{id}",
    tag = "categories",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Removed category", body = DataResponse<Category>),
        (status = 422, description = "Category not found.", body = ValidationErrorResponse)
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<Category>>, ApiError> {
    let id = parse_id(&raw_id, CATEGORY_NOT_FOUND)?;
    let category = state
        .repo
        .delete_category(id)
        .await?
        .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND, &raw_id))?;
    Ok(Json(DataResponse { data: category }))
}
