use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError, trimmed, trimmed_tags};
use crate::models::{
    Category, CreateCategoryRequest, CreateGalleryItemRequest, CreatePostRequest,
    CreateSubscriberRequest, GalleryItem, NewSession, NewUser, Page, Post, Subscriber,
    UpdateCategoryRequest, UpdateGalleryItemRequest, UpdatePostRequest, UpdateSubscriberRequest,
    UpdateUserRequest, User, UserCredentials,
};

const USER_COLUMNS: &str = "id, email, username, created, updated";
const POST_COLUMNS: &str = "id, title, synopsis, slug, content, hero, category, active, user_id, \
                            meta, stars, readtime, views, created, updated";
const CATEGORY_COLUMNS: &str = "id, name, description, created, updated";
const SUBSCRIBER_COLUMNS: &str = "id, email, name, subscribed, created, updated";
const GALLERY_COLUMNS: &str = "id, name, filename, path, thumbnail, tags, created, updated";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Unique fields are enforced by `<table>_<field>_key` constraints (see `migrations/`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Maps a driver error, turning unique violations into `Duplicate(<field>)`.
fn map_err(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            if let Some(field) = db.constraint().and_then(unique_field) {
                return RepositoryError::Duplicate(field);
            }
        }
    }
    RepositoryError::Database(e)
}

/// `users_email_key` -> `email`
fn unique_field(constraint: &str) -> Option<String> {
    constraint
        .strip_suffix("_key")
        .and_then(|rest| rest.rsplit('_').next())
        .map(str::to_string)
}

/// LIMIT/OFFSET binds. A NULL limit means "no limit" in Postgres.
fn window(page: Option<Page>) -> (Option<i64>, i64) {
    match page {
        Some(p) => (Some(p.size), p.offset()),
        None => (None, 0),
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn list_users(&self, page: Option<Page>) -> RepoResult<Vec<User>> {
        let (limit, offset) = window(page);
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created ASC, id ASC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, password FROM users WHERE username = $1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, username, password, created, updated) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.email.trim())
            .bind(user.username.trim())
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }

    /// Uses `COALESCE` so that only the supplied fields change.
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> RepoResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET email = COALESCE($2, email), username = COALESCE($3, username), \
             updated = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(trimmed(&req.email))
            .bind(trimmed(&req.username))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    // --- SESSIONS ---

    async fn create_session(&self, session: NewSession) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created, expires_at) VALUES ($1, $2, NOW(), $3)",
        )
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn get_session_user(&self, token_hash: &[u8]) -> RepoResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM sessions WHERE token_hash = $1 AND expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_session(&self, token_hash: &[u8]) -> RepoResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    // --- POSTS ---

    async fn list_posts(&self, page: Option<Page>) -> RepoResult<Vec<Post>> {
        let (limit, offset) = window(page);
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created ASC, id ASC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_active_post_by_slug(&self, slug: &str) -> RepoResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1 AND active IS TRUE");
        sqlx::query_as::<_, Post>(&sql)
            .bind(slug.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_latest_posts(&self, limit: i64) -> RepoResult<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE active IS TRUE ORDER BY created DESC LIMIT $1"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn create_post(&self, req: CreatePostRequest, author: Uuid) -> RepoResult<Post> {
        let sql = format!(
            "INSERT INTO posts (id, title, synopsis, slug, content, hero, category, active, user_id, \
             meta, readtime, created, updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW()) \
             RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.title.trim())
            .bind(trimmed(&req.synopsis))
            .bind(req.slug.trim())
            .bind(trimmed(&req.content))
            .bind(req.hero)
            .bind(&req.category)
            .bind(req.active)
            .bind(author)
            .bind(trimmed(&req.meta))
            .bind(req.readtime)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> RepoResult<Option<Post>> {
        let sql = format!(
            "UPDATE posts SET title = COALESCE($2, title), synopsis = COALESCE($3, synopsis), \
             slug = COALESCE($4, slug), content = COALESCE($5, content), \
             hero = COALESCE($6, hero), category = COALESCE($7, category), \
             active = COALESCE($8, active), meta = COALESCE($9, meta), \
             readtime = COALESCE($10, readtime), updated = NOW() \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(trimmed(&req.title))
            .bind(trimmed(&req.synopsis))
            .bind(trimmed(&req.slug))
            .bind(trimmed(&req.content))
            .bind(req.hero)
            .bind(req.category)
            .bind(req.active)
            .bind(trimmed(&req.meta))
            .bind(req.readtime)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        let sql = format!("DELETE FROM posts WHERE id = $1 RETURNING {POST_COLUMNS}");
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    // --- CATEGORIES ---

    async fn list_categories(&self, page: Option<Page>) -> RepoResult<Vec<Category>> {
        let (limit, offset) = window(page);
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY created ASC, id ASC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category> {
        let sql = format!(
            "INSERT INTO categories (id, name, description, created, updated) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.name.trim())
            .bind(trimmed(&req.description))
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> RepoResult<Option<Category>> {
        let sql = format!(
            "UPDATE categories SET name = COALESCE($2, name), \
             description = COALESCE($3, description), updated = NOW() \
             WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(trimmed(&req.name))
            .bind(trimmed(&req.description))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        let sql = format!("DELETE FROM categories WHERE id = $1 RETURNING {CATEGORY_COLUMNS}");
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    // --- SUBSCRIBERS ---

    async fn list_subscribers(&self, page: Option<Page>) -> RepoResult<Vec<Subscriber>> {
        let (limit, offset) = window(page);
        let sql = format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM subscribers ORDER BY created ASC, id ASC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Subscriber>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_subscriber(&self, id: Uuid) -> RepoResult<Option<Subscriber>> {
        let sql = format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers WHERE id = $1");
        sqlx::query_as::<_, Subscriber>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn create_subscriber(&self, req: CreateSubscriberRequest) -> RepoResult<Subscriber> {
        let sql = format!(
            "INSERT INTO subscribers (id, email, name, subscribed, created, updated) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {SUBSCRIBER_COLUMNS}"
        );
        sqlx::query_as::<_, Subscriber>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.email.trim())
            .bind(trimmed(&req.name))
            .bind(req.subscribed)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn update_subscriber(
        &self,
        id: Uuid,
        req: UpdateSubscriberRequest,
    ) -> RepoResult<Option<Subscriber>> {
        let sql = format!(
            "UPDATE subscribers SET email = COALESCE($2, email), name = COALESCE($3, name), \
             subscribed = COALESCE($4, subscribed), updated = NOW() \
             WHERE id = $1 RETURNING {SUBSCRIBER_COLUMNS}"
        );
        sqlx::query_as::<_, Subscriber>(&sql)
            .bind(id)
            .bind(trimmed(&req.email))
            .bind(trimmed(&req.name))
            .bind(req.subscribed)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn delete_subscriber(&self, id: Uuid) -> RepoResult<Option<Subscriber>> {
        let sql = format!("DELETE FROM subscribers WHERE id = $1 RETURNING {SUBSCRIBER_COLUMNS}");
        sqlx::query_as::<_, Subscriber>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    // --- GALLERY ---

    async fn list_gallery(&self, page: Option<Page>) -> RepoResult<Vec<GalleryItem>> {
        let (limit, offset) = window(page);
        let sql = format!(
            "SELECT {GALLERY_COLUMNS} FROM gallery_items ORDER BY created ASC, id ASC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn get_gallery_item(&self, id: Uuid) -> RepoResult<Option<GalleryItem>> {
        let sql = format!("SELECT {GALLERY_COLUMNS} FROM gallery_items WHERE id = $1");
        sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn create_gallery_item(&self, req: CreateGalleryItemRequest) -> RepoResult<GalleryItem> {
        let sql = format!(
            "INSERT INTO gallery_items (id, name, filename, path, thumbnail, tags, created, updated) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING {GALLERY_COLUMNS}"
        );
        sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.name.trim())
            .bind(req.filename.trim())
            .bind(trimmed(&req.path))
            .bind(trimmed(&req.thumbnail))
            .bind(trimmed_tags(&req.tags))
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn update_gallery_item(
        &self,
        id: Uuid,
        req: UpdateGalleryItemRequest,
    ) -> RepoResult<Option<GalleryItem>> {
        let sql = format!(
            "UPDATE gallery_items SET name = COALESCE($2, name), tags = COALESCE($3, tags), \
             updated = NOW() WHERE id = $1 RETURNING {GALLERY_COLUMNS}"
        );
        sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(id)
            .bind(trimmed(&req.name))
            .bind(req.tags.as_deref().map(trimmed_tags))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    /// `posts.hero` is a soft reference, so posts showing the item are cleared in the
    /// same transaction.
    async fn delete_gallery_item(&self, id: Uuid) -> RepoResult<Option<GalleryItem>> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        let sql = format!("DELETE FROM gallery_items WHERE id = $1 RETURNING {GALLERY_COLUMNS}");
        let removed = sqlx::query_as::<_, GalleryItem>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_err)?;
        if removed.is_some() {
            sqlx::query("UPDATE posts SET hero = NULL WHERE hero = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;
        }
        tx.commit().await.map_err(map_err)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_constraint_names_map_to_fields() {
        assert_eq!(unique_field("users_email_key").as_deref(), Some("email"));
        assert_eq!(unique_field("gallery_items_filename_key").as_deref(), Some("filename"));
        assert_eq!(unique_field("posts_pkey"), None);
    }

    #[test]
    fn window_without_page_is_unbounded() {
        assert_eq!(window(None), (None, 0));
        assert_eq!(window(Some(Page { number: 3, size: 20 })), (Some(20), 40));
    }
}
