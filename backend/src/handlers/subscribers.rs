use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::{ApiJson, ListQuery, SUBSCRIBER_NOT_FOUND, validated};
use crate::{
    AppState,
    error::ApiError,
    models::{
        CreateSubscriberRequest, DataResponse, MessageResponse, RowsResponse, Subscriber,
        UpdateSubscriberRequest, ValidationErrorResponse,
    },
    validation::{parse_id, parse_page},
};

/// list_subscribers
///
/// [Authenticated Route] Lists newsletter subscribers in sign-up order.
#[utoipa::path(
    get,
    path = "/api/subscriber",
    tag = "subscribers",
    params(ListQuery),
    responses(
        (status = 200, description = "Subscribers", body = RowsResponse<Subscriber>),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 422, description = "Invalid page parameter", body = ValidationErrorResponse)
    )
)]
pub async fn list_subscribers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RowsResponse<Subscriber>>, ApiError> {
    let page = parse_page(query.page.as_deref(), state.config.page_size)?;
    let rows = state.repo.list_subscribers(page).await?;
    Ok(Json(RowsResponse { rows }))
}

#[utoipa::path(
    get,
    path = "/api/subscriber/{id}",
    tag = "subscribers",
    params(("id" = String, Path, description = "Subscriber ID")),
    responses(
        (status = 200, description = "Subscriber", body = DataResponse<Subscriber>),
        (status = 422, description = "Subscriber not found.", body = ValidationErrorResponse)
    )
)]
pub async fn get_subscriber(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<Subscriber>>, ApiError> {
    let id = parse_id(&raw_id, SUBSCRIBER_NOT_FOUND)?;
    let subscriber = state
        .repo
        .get_subscriber(id)
        .await?
        .ok_or_else(|| ApiError::not_found(SUBSCRIBER_NOT_FOUND, &raw_id))?;
    Ok(Json(DataResponse { data: subscriber }))
}

#[utoipa::path(
    post,
    path = "/api/subscriber",
    tag = "subscribers",
    request_body = CreateSubscriberRequest,
    responses(
        (status = 200, description = "Created subscriber", body = DataResponse<Subscriber>),
        (status = 400, description = "Email already exists", body = MessageResponse),
        (status = 422, description = "Field errors", body = ValidationErrorResponse)
    )
)]
pub async fn create_subscriber(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateSubscriberRequest>,
) -> Result<Json<DataResponse<Subscriber>>, ApiError> {
    let payload = validated(payload)?;
    let subscriber = state.repo.create_subscriber(payload).await?;
    Ok(Json(DataResponse { data: subscriber }))
}

#[utoipa::path(
    put,
    path = "/api/subscriber/{id}",
    tag = "subscribers",
    params(("id" = String, Path, description = "Subscriber ID")),
    request_body = UpdateSubscriberRequest,
    responses(
        (status = 200, description = "Updated subscriber", body = DataResponse<Subscriber>),
        (status = 400, description = "Email already exists", body = MessageResponse),
        (status = 422, description = "Subscriber not found. / field errors", body = ValidationErrorResponse)
    )
)]
pub async fn update_subscriber(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateSubscriberRequest>,
) -> Result<Json<DataResponse<Subscriber>>, ApiError> {
    let missing = || ApiError::not_found(SUBSCRIBER_NOT_FOUND, &raw_id);
    let id = parse_id(&raw_id, SUBSCRIBER_NOT_FOUND)?;
    state.repo.get_subscriber(id).await?.ok_or_else(missing)?;

    let payload = validated(payload)?;
    let subscriber = state
        .repo
        .update_subscriber(id, payload)
        .await?
        .ok_or_else(missing)?;
    Ok(Json(DataResponse { data: subscriber }))
}

#[utoipa::path(
    delete,
    path = "/api/subscriber/{id}",
    tag = "subscribers",
    params(("id" = String, Path, description = "Subscriber ID")),
    responses(
        (status = 200, description = "Removed subscriber", body = DataResponse<Subscriber>),
        (status = 422, description = "Subscriber not found.", body = ValidationErrorResponse)
    )
)]
pub async fn delete_subscriber(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<Subscriber>>, ApiError> {
    let id = parse_id(&raw_id, SUBSCRIBER_NOT_FOUND)?;
    let subscriber = state
        .repo
        .delete_subscriber(id)
        .await?
        .ok_or_else(|| ApiError::not_found(SUBSCRIBER_NOT_FOUND, &raw_id))?;
    Ok(Json(DataResponse { data: subscriber }))
}
