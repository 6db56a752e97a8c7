use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Stored Records ---

/// User
///
/// A back-office account from the `users` table. The password hash lives in the same row
/// but is never selected into this struct, so it can't leak into a response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal projection used only by the login flow to verify a password.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    // Argon2 PHC string.
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

/// Post
///
/// A blog post from the `posts` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub synopsis: Option<String>,
    pub slug: String,
    pub content: Option<String>,
    // Gallery item used as the hero image.
    pub hero: Option<Uuid>,
    // Category ids.
    pub category: Vec<Uuid>,
    pub active: Option<bool>,
    /// Author of the post. Stored as `user_id`, serialized as `user`.
    #[sqlx(rename = "user_id")]
    pub user: Option<Uuid>,
    pub meta: Option<String>,
    pub stars: Option<i32>,
    pub readtime: Option<i32>,
    pub views: Option<i32>,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated: DateTime<Utc>,
}

/// Subscriber
///
/// A newsletter subscriber. `subscribed` is left unset until the visitor confirms or opts out.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub subscribed: Option<bool>,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated: DateTime<Utc>,
}

/// GalleryItem
///
/// A media file in the gallery. `filename` is the object key in the media bucket.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct GalleryItem {
    pub id: Uuid,
    pub name: String,
    pub filename: String,
    pub path: Option<String>,
    pub thumbnail: Option<String>,
    pub tags: Vec<String>,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated: DateTime<Utc>,
}

/// NewUser
///
/// A user ready to be inserted: the password has already been hashed by the auth layer.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// NewSession
///
/// Server-side session row. Only the peppered hash of the cookie token is stored.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token_hash: Vec<u8>,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---
//
// Create payloads default missing fields so that absent values reach the validators
// and come back as field errors instead of a deserialization failure.
// Update payloads use `Option<T>`: only supplied fields are changed.

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct CreatePostRequest {
    pub title: String,
    pub synopsis: Option<String>,
    pub slug: String,
    pub content: Option<String>,
    pub hero: Option<Uuid>,
    pub category: Vec<Uuid>,
    pub active: Option<bool>,
    pub meta: Option<String>,
    pub readtime: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readtime: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct CreateSubscriberRequest {
    pub email: String,
    pub name: Option<String>,
    pub subscribed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateSubscriberRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct CreateGalleryItemRequest {
    pub name: String,
    // Object key returned by the upload endpoint.
    pub filename: String,
    pub path: Option<String>,
    pub thumbnail: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateGalleryItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// UploadRequest
///
/// Input payload for requesting a short-lived upload URL for a gallery file.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
#[serde(default)]
pub struct UploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "header.png")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "image/png")]
    pub file_type: String,
}

/// UploadResponse
///
/// The presigned URL for the client-side PUT, and the object key to store as the
/// gallery item's `filename`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct UploadResponse {
    pub upload_url: String,
    pub resource_key: String,
}

// --- Response Envelopes ---

/// `{ "data": ... }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataResponse<T> {
    pub data: T,
}

/// `{ "rows": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RowsResponse<T> {
    pub rows: Vec<T>,
}

/// `{ "message": ..., "success": ... }`
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

/// FieldError
///
/// One entry of a 422 response body: which input failed, where it came from, and why.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct FieldError {
    // "body", "params" or "query".
    pub location: String,
    pub param: String,
    pub msg: String,
    #[ts(type = "unknown")]
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

/// `{ "errors": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ValidationErrorResponse {
    pub errors: Vec<FieldError>,
}

/// A page window computed from the `?page=` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    // 1-based page number.
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }
}
