use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use super::{ApiJson, GALLERY_NOT_FOUND, ListQuery, validated};
use crate::{
    AppState,
    error::ApiError,
    models::{
        CreateGalleryItemRequest, DataResponse, GalleryItem, MessageResponse, RowsResponse,
        UpdateGalleryItemRequest, UploadRequest, UploadResponse, ValidationErrorResponse,
    },
    validation::{parse_id, parse_page},
};

/// Prefix of every gallery object key in the media bucket.
pub const GALLERY_KEY_PREFIX: &str = "gallery";

/// Builds `gallery/<uuid>.<ext>`, keeping the extension only when it is plain alphanumeric.
pub fn gallery_object_key(filename: &str) -> String {
    let extension = std::path::Path::new(filename.trim())
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    format!("{GALLERY_KEY_PREFIX}/{}.{extension}", Uuid::new_v4())
}

#[utoipa::path(
    get,
    path = "/api/gallery",
    tag = "gallery",
    params(ListQuery),
    responses(
        (status = 200, description = "Gallery items", body = RowsResponse<GalleryItem>),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 422, description = "Invalid page parameter", body = ValidationErrorResponse)
    )
)]
pub async fn list_gallery(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RowsResponse<GalleryItem>>, ApiError> {
    let page = parse_page(query.page.as_deref(), state.config.page_size)?;
    let rows = state.repo.list_gallery(page).await?;
    Ok(Json(RowsResponse { rows }))
}

#[utoipa::path(
    get,
    path = "/api/gallery/{id}",
    tag = "gallery",
    params(("id" = String, Path, description = "Gallery item ID")),
    responses(
        (status = 200, description = "Gallery item", body = DataResponse<GalleryItem>),
        (status = 422, description = "Gallery not found.", body = ValidationErrorResponse)
    )
)]
pub async fn get_gallery_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<GalleryItem>>, ApiError> {
    let id = parse_id(&raw_id, GALLERY_NOT_FOUND)?;
    let item = state
        .repo
        .get_gallery_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found(GALLERY_NOT_FOUND, &raw_id))?;
    Ok(Json(DataResponse { data: item }))
}

/// create_gallery_item
///
/// [Authenticated Route] Registers a file that was uploaded through the presigned URL.
/// `filename` is the `resource_key` returned by `/api/gallery/upload`.
#[utoipa::path(
    post,
    path = "/api/gallery",
    tag = "gallery",
    request_body = CreateGalleryItemRequest,
    responses(
        (status = 200, description = "Created gallery item", body = DataResponse<GalleryItem>),
        (status = 400, description = "Filename already exists", body = MessageResponse),
        (status = 422, description = "Field errors", body = ValidationErrorResponse)
    )
)]
pub async fn create_gallery_item(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateGalleryItemRequest>,
) -> Result<Json<DataResponse<GalleryItem>>, ApiError> {
    let payload = validated(payload)?;
    let item = state.repo.create_gallery_item(payload).await?;
    Ok(Json(DataResponse { data: item }))
}

#[utoipa::path(
    put,
    path = "/api/gallery/{id}",
    tag = "gallery",
    params(("id" = String, Path, description = "Gallery item ID")),
    request_body = UpdateGalleryItemRequest,
    responses(
        (status = 200, description = "Updated gallery item", body = DataResponse<GalleryItem>),
        (status = 422, description = "Gallery not found. / field errors", body = ValidationErrorResponse)
    )
)]
pub async fn update_gallery_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateGalleryItemRequest>,
) -> Result<Json<DataResponse<GalleryItem>>, ApiError> {
    let missing = || ApiError::not_found(GALLERY_NOT_FOUND, &raw_id);
    let id = parse_id(&raw_id, GALLERY_NOT_FOUND)?;
    state.repo.get_gallery_item(id).await?.ok_or_else(missing)?;

    let payload = validated(payload)?;
    let item = state
        .repo
        .update_gallery_item(id, payload)
        .await?
        .ok_or_else(missing)?;
    Ok(Json(DataResponse { data: item }))
}

/// delete_gallery_item
///
/// [Authenticated Route] Removes the record, then its object in the media bucket.
/// The record is the source of truth: a failed object delete is logged, not returned.
#[utoipa::path(
    delete,
    path = "/api/gallery/{id}",
    tag = "gallery",
    params(("id" = String, Path, description = "Gallery item ID")),
    responses(
        (status = 200, description = "Removed gallery item", body = DataResponse<GalleryItem>),
        (status = 422, description = "Gallery not found.", body = ValidationErrorResponse)
    )
)]
pub async fn delete_gallery_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<GalleryItem>>, ApiError> {
    let id = parse_id(&raw_id, GALLERY_NOT_FOUND)?;
    let item = state
        .repo
        .delete_gallery_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found(GALLERY_NOT_FOUND, &raw_id))?;

    if let Err(e) = state.storage.delete_object(&item.filename).await {
        tracing::warn!(key = %item.filename, "gallery object left in storage: {}", e);
    }
    Ok(Json(DataResponse { data: item }))
}

/// request_upload_url
///
/// [Authenticated Route] Signs a 10-minute PUT URL so the browser uploads the file
/// straight to the media bucket. The returned `resource_key` is then sent back as the
/// gallery item's `filename`.
#[utoipa::path(
    post,
    path = "/api/gallery/upload",
    tag = "gallery",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Presigned upload URL", body = DataResponse<UploadResponse>),
        (status = 422, description = "Field errors", body = ValidationErrorResponse),
        (status = 500, description = "Storage unavailable", body = MessageResponse)
    )
)]
pub async fn request_upload_url(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UploadRequest>,
) -> Result<Json<DataResponse<UploadResponse>>, ApiError> {
    let payload = validated(payload)?;
    let resource_key = gallery_object_key(&payload.filename);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&resource_key, payload.file_type.trim())
        .await?;

    Ok(Json(DataResponse {
        data: UploadResponse {
            upload_url,
            resource_key,
        },
    }))
}
