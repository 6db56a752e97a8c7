use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Category, CreateCategoryRequest, CreateGalleryItemRequest, CreatePostRequest,
    CreateSubscriberRequest, GalleryItem, NewSession, NewUser, Page, Post, Subscriber,
    UpdateCategoryRequest, UpdateGalleryItemRequest, UpdatePostRequest, UpdateSubscriberRequest,
    UpdateUserRequest, User, UserCredentials,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Store failures the handlers care to tell apart. A unique-constraint violation names
/// the offending field; anything else is opaque to the client.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, so handlers can work
/// against Postgres in production and the in-memory store in local runs and tests.
///
/// Every method maps onto a single store call. `list_*` methods return records in
/// creation order; a `Page` restricts the result to one window. `update_*` methods only
/// change the supplied fields and refresh `updated`; they return `None` for an unknown id,
/// as do the `delete_*` methods, which otherwise return the removed record.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn list_users(&self, page: Option<Page>) -> RepoResult<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    // Login lookup; the only method that reads the password hash.
    async fn get_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> RepoResult<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> RepoResult<Option<User>>;

    // --- Sessions ---
    async fn create_session(&self, session: NewSession) -> RepoResult<()>;
    // Resolves a token hash to its user, ignoring expired sessions.
    async fn get_session_user(&self, token_hash: &[u8]) -> RepoResult<Option<Uuid>>;
    // Idempotent: deleting a missing session is not an error.
    async fn delete_session(&self, token_hash: &[u8]) -> RepoResult<()>;

    // --- Posts ---
    async fn list_posts(&self, page: Option<Page>) -> RepoResult<Vec<Post>>;
    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>>;
    // Public lookup: only active posts are visible by slug.
    async fn get_active_post_by_slug(&self, slug: &str) -> RepoResult<Option<Post>>;
    // Active posts, newest first.
    async fn get_latest_posts(&self, limit: i64) -> RepoResult<Vec<Post>>;
    async fn create_post(&self, req: CreatePostRequest, author: Uuid) -> RepoResult<Post>;
    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> RepoResult<Option<Post>>;
    async fn delete_post(&self, id: Uuid) -> RepoResult<Option<Post>>;

    // --- Categories ---
    async fn list_categories(&self, page: Option<Page>) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>>;
    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category>;
    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> RepoResult<Option<Category>>;
    async fn delete_category(&self, id: Uuid) -> RepoResult<Option<Category>>;

    // --- Subscribers ---
    async fn list_subscribers(&self, page: Option<Page>) -> RepoResult<Vec<Subscriber>>;
    async fn get_subscriber(&self, id: Uuid) -> RepoResult<Option<Subscriber>>;
    async fn create_subscriber(&self, req: CreateSubscriberRequest) -> RepoResult<Subscriber>;
    async fn update_subscriber(
        &self,
        id: Uuid,
        req: UpdateSubscriberRequest,
    ) -> RepoResult<Option<Subscriber>>;
    async fn delete_subscriber(&self, id: Uuid) -> RepoResult<Option<Subscriber>>;

    // --- Gallery ---
    async fn list_gallery(&self, page: Option<Page>) -> RepoResult<Vec<GalleryItem>>;
    async fn get_gallery_item(&self, id: Uuid) -> RepoResult<Option<GalleryItem>>;
    async fn create_gallery_item(&self, req: CreateGalleryItemRequest) -> RepoResult<GalleryItem>;
    async fn update_gallery_item(
        &self,
        id: Uuid,
        req: UpdateGalleryItemRequest,
    ) -> RepoResult<Option<GalleryItem>>;
    async fn delete_gallery_item(&self, id: Uuid) -> RepoResult<Option<GalleryItem>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Trims an optional text field the way every store persists it.
pub(crate) fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_deref().map(|v| v.trim().to_string())
}

/// Trims every entry of a tag list, dropping the ones left empty.
pub(crate) fn trimmed_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
