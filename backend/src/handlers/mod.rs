use axum::{
    Form, Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::header,
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{error::ApiError, validation::Validate};

pub mod categories;
pub mod front;
pub mod gallery;
pub mod login;
pub mod posts;
pub mod subscribers;
pub mod users;

pub const USER_NOT_FOUND: &str = "User not found.";
pub const POST_NOT_FOUND: &str = "Post not found.";
pub const CATEGORY_NOT_FOUND: &str = "Category not found.";
pub const SUBSCRIBER_NOT_FOUND: &str = "Subscriber not found.";
pub const GALLERY_NOT_FOUND: &str = "Gallery not found.";

/// ListQuery
///
/// Accepted query parameters for every list endpoint. `page` is kept as raw text so an
/// invalid value becomes a field error rather than a generic query rejection.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// 1-based page number. Omit to receive every record.
    pub page: Option<String>,
}

/// ApiJson
///
/// `Json<T>` whose rejection (bad content type, malformed body) is reported as an
/// `ApiError`, so clients always receive `{ message, success }`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// ApiJsonOrForm
///
/// Accepts either a JSON body or an `application/x-www-form-urlencoded` one, chosen by
/// `Content-Type`. Used where plain HTML forms post directly, such as login.
pub struct ApiJsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for ApiJsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(Self(value))
        } else {
            let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
            Ok(Self(value))
        }
    }
}

/// Runs the payload's field rules and hands the payload back on success.
pub(crate) fn validated<T: Validate>(payload: T) -> Result<T, ApiError> {
    payload.validate()?;
    Ok(payload)
}
