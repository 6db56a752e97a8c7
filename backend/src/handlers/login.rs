use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};

use super::{ApiJsonOrForm, validated};
use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{LoginRequest, MessageResponse, ValidationErrorResponse},
};

pub const LOGIN_OK_MESSAGE: &str = "Logged in successfully";
pub const LOGOUT_OK_MESSAGE: &str = "Logged out successfully";
pub const AUTHENTICATED_MESSAGE: &str = "Authenticated";

/// login
///
/// [Public Route] Checks the credentials, opens a session and sets the `sid` cookie.
/// Takes a JSON or a url-encoded form body.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened, cookie set", body = MessageResponse),
        (status = 401, description = "Username or password invalid", body = MessageResponse),
        (status = 422, description = "Missing username or password", body = ValidationErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJsonOrForm(payload): ApiJsonOrForm<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = validated(payload)?;
    let token = auth::login(&state.repo, &state.config, &payload).await?;
    let cookie = auth::session_cookie(&token, &state.config)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::ok(LOGIN_OK_MESSAGE)),
    ))
}

/// logout
///
/// [Public Route] Ends the current session, if any, and expires the cookie. Always succeeds
/// from the client's point of view.
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    responses((status = 200, description = "Session closed, cookie cleared", body = MessageResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(e) = auth::logout(&state.repo, &state.config, &headers).await {
        tracing::warn!("session could not be deleted on logout: {}", e);
    }
    let cookie = auth::clear_session_cookie(&state.config)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::ok(LOGOUT_OK_MESSAGE)),
    ))
}

/// is_authenticated
///
/// [Public Route] Lets the frontend probe whether its cookie still maps to a live session.
#[utoipa::path(
    get,
    path = "/api/isauthenticated",
    tag = "auth",
    responses(
        (status = 200, description = "Session is valid", body = MessageResponse),
        (status = 401, description = "Authentication required", body = MessageResponse)
    )
)]
pub async fn is_authenticated(
    user: Result<AuthUser, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = user?;
    tracing::debug!(user_id = %user.id, "session check passed");
    Ok(Json(MessageResponse::ok(AUTHENTICATED_MESSAGE)))
}
