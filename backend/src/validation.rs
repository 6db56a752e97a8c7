use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        CreateCategoryRequest, CreateGalleryItemRequest, CreatePostRequest,
        CreateSubscriberRequest, CreateUserRequest, FieldError, LoginRequest, Page,
        UpdateCategoryRequest, UpdateGalleryItemRequest, UpdatePostRequest,
        UpdateSubscriberRequest, UpdateUserRequest, UploadRequest,
    },
};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub const INVALID_PAGE: &str = "Invalid page parameter";
pub const INVALID_EMAIL: &str = "Not a valid email address";
pub const NOT_ALPHANUMERIC: &str = "Should be alphanumeric";
pub const MIN_2: &str = "Should be min 2 characters";
pub const MIN_5: &str = "Should be min 5 characters";

/// Validator
///
/// Collects field errors for a request body. Every rule checks the trimmed value,
/// since the store persists trimmed strings.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, param: &str, value: &str, msg: &str) {
        self.errors.push(FieldError {
            location: "body".to_string(),
            param: param.to_string(),
            msg: msg.to_string(),
            value: Value::String(value.to_string()),
        });
    }

    pub fn required(&mut self, param: &str, value: &str, msg: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(param, value, msg);
        }
        self
    }

    pub fn min_len(&mut self, param: &str, value: &str, min: usize, msg: &str) -> &mut Self {
        if value.trim().chars().count() < min {
            self.push(param, value, msg);
        }
        self
    }

    pub fn alphanumeric(&mut self, param: &str, value: &str) -> &mut Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            self.push(param, value, NOT_ALPHANUMERIC);
        }
        self
    }

    pub fn email(&mut self, param: &str, value: &str) -> &mut Self {
        if !EMAIL_PATTERN.is_match(value.trim()) {
            self.push(param, value, INVALID_EMAIL);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Request payloads that carry field-level rules.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .required("username", &self.username, "Username is required")
            .required("password", &self.password, "Password is required")
            .finish()
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .email("email", &self.email)
            .min_len("username", &self.username, 5, MIN_5)
            .alphanumeric("username", &self.username)
            .min_len("password", &self.password, 2, "Should be min 2 chars")
            .finish()
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(email) = &self.email {
            v.email("email", email);
        }
        if let Some(username) = &self.username {
            v.min_len("username", username, 5, MIN_5).alphanumeric("username", username);
        }
        v.finish()
    }
}

impl Validate for CreatePostRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .min_len("title", &self.title, 5, MIN_5)
            .min_len("slug", &self.slug, 5, MIN_5)
            .finish()
    }
}

impl Validate for UpdatePostRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(title) = &self.title {
            v.min_len("title", title, 5, MIN_5);
        }
        if let Some(slug) = &self.slug {
            v.min_len("slug", slug, 5, MIN_5);
        }
        v.finish()
    }
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new().min_len("name", &self.name, 2, MIN_2).finish()
    }
}

impl Validate for UpdateCategoryRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.min_len("name", name, 2, MIN_2);
        }
        v.finish()
    }
}

impl Validate for CreateSubscriberRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new().email("email", &self.email).finish()
    }
}

impl Validate for UpdateSubscriberRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(email) = &self.email {
            v.email("email", email);
        }
        v.finish()
    }
}

impl Validate for CreateGalleryItemRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .min_len("name", &self.name, 2, MIN_2)
            .required("filename", &self.filename, "Filename is required")
            .finish()
    }
}

impl Validate for UpdateGalleryItemRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.min_len("name", name, 2, MIN_2).alphanumeric("name", name);
        }
        v.finish()
    }
}

impl Validate for UploadRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .required("filename", &self.filename, "Filename is required")
            .required("file_type", &self.file_type, "File type is required")
            .finish()
    }
}

/// parse_page
///
/// Turns the optional `?page=` query value into a page window. A value that is not an
/// integer, or is below 1, is rejected with "Invalid page parameter".
pub fn parse_page(raw: Option<&str>, size: i64) -> Result<Option<Page>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<i64>() {
        Ok(number) if number >= 1 => Ok(Some(Page { number, size })),
        _ => Err(ApiError::Validation(vec![FieldError {
            location: "query".to_string(),
            param: "page".to_string(),
            msg: INVALID_PAGE.to_string(),
            value: Value::String(raw.to_string()),
        }])),
    }
}

/// parse_id
///
/// A malformed id can never match a record, so it fails the same way as an unknown one.
pub fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(not_found, raw))
}
