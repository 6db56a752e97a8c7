use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    models::{FieldError, MessageResponse, ValidationErrorResponse},
    repository::RepositoryError,
    storage::StorageError,
};

/// Generic text for store failures; the underlying error is only logged.
pub const DATA_ERROR_MESSAGE: &str = "Unable to process the request";
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required";

/// ApiError
///
/// Every failure a handler or extractor can surface to the client.
///
/// - `Validation` -> 422 `{ errors: [...] }`
/// - `Conflict`, `BadRequest` -> 400 `{ message, success: false }`
/// - `Unauthorized` -> 401 `{ message, success: false }`
/// - `Storage`, `Internal` -> 500 `{ message, success: false }`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// The existence check failure for an `{id}` path parameter.
    pub fn not_found(msg: &str, id: &str) -> Self {
        Self::Validation(vec![FieldError {
            location: "params".to_string(),
            param: "id".to_string(),
            msg: msg.to_string(),
            value: serde_json::Value::String(id.to_string()),
        }])
    }

    pub fn auth_required() -> Self {
        Self::Unauthorized(AUTH_REQUIRED_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(errors) => {
                (status, Json(ValidationErrorResponse { errors })).into_response()
            }
            other => (status, Json(MessageResponse::failed(other.to_string()))).into_response(),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(field) => Self::Conflict(field),
            RepositoryError::Database(e) => {
                tracing::error!("store error: {:?}", e);
                Self::BadRequest(DATA_ERROR_MESSAGE.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::error!("storage error: {}", err);
        Self::Storage("Failed to reach media storage".to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
