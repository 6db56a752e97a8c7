use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError, trimmed, trimmed_tags};
use crate::models::{
    Category, CreateCategoryRequest, CreateGalleryItemRequest, CreatePostRequest,
    CreateSubscriberRequest, GalleryItem, NewSession, NewUser, Page, Post, Subscriber,
    UpdateCategoryRequest, UpdateGalleryItemRequest, UpdatePostRequest, UpdateSubscriberRequest,
    UpdateUserRequest, User, UserCredentials,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<(User, String)>,
    sessions: Vec<NewSession>,
    posts: Vec<Post>,
    categories: Vec<Category>,
    subscribers: Vec<Subscriber>,
    gallery: Vec<GalleryItem>,
}

/// InMemoryRepository
///
/// A process-local store with the same contract as `PostgresRepository`: unique fields,
/// creation order, page windows, session expiry and delete cascades. Post `hero` and
/// `category` ids are stored as given, as the database does. Used when no
/// `DATABASE_URL` is configured for a local run, and by the test suite.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn window<T: Clone>(rows: &[T], page: Option<Page>) -> Vec<T> {
    match page {
        Some(p) => rows
            .iter()
            .skip(usize::try_from(p.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(p.size).unwrap_or(0))
            .cloned()
            .collect(),
        None => rows.to_vec(),
    }
}

fn ensure_unique<T>(
    rows: &[T],
    skip: Option<Uuid>,
    id: impl Fn(&T) -> Uuid,
    value: impl Fn(&T) -> &str,
    candidate: Option<&str>,
    field: &str,
) -> RepoResult<()> {
    let Some(candidate) = candidate else {
        return Ok(());
    };
    let taken = rows
        .iter()
        .filter(|row| Some(id(row)) != skip)
        .any(|row| value(row) == candidate);
    if taken {
        return Err(RepositoryError::Duplicate(field.to_string()));
    }
    Ok(())
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: Uuid, key: impl Fn(&T) -> Uuid) -> Option<T> {
    let index = rows.iter().position(|row| key(row) == id)?;
    Some(rows.remove(index))
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- USERS ---

    async fn list_users(&self, page: Option<Page>) -> RepoResult<Vec<User>> {
        let tables = self.lock();
        let users: Vec<User> = tables.users.iter().map(|(u, _)| u.clone()).collect();
        Ok(window(&users, page))
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let tables = self.lock();
        Ok(tables
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }

    async fn get_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>> {
        let tables = self.lock();
        let username = username.trim();
        Ok(tables
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .map(|(u, hash)| UserCredentials {
                id: u.id,
                username: u.username.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.lock();
        let email = user.email.trim().to_string();
        let username = user.username.trim().to_string();
        ensure_unique(
            &tables.users,
            None,
            |(u, _)| u.id,
            |(u, _)| u.email.as_str(),
            Some(&email),
            "email",
        )?;
        ensure_unique(
            &tables.users,
            None,
            |(u, _)| u.id,
            |(u, _)| u.username.as_str(),
            Some(&username),
            "username",
        )?;
        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email,
            username,
            created: now,
            updated: now,
        };
        tables.users.push((record.clone(), user.password_hash));
        Ok(record)
    }

    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> RepoResult<Option<User>> {
        let mut tables = self.lock();
        let email = trimmed(&req.email);
        let username = trimmed(&req.username);
        ensure_unique(
            &tables.users,
            Some(id),
            |(u, _)| u.id,
            |(u, _)| u.email.as_str(),
            email.as_deref(),
            "email",
        )?;
        ensure_unique(
            &tables.users,
            Some(id),
            |(u, _)| u.id,
            |(u, _)| u.username.as_str(),
            username.as_deref(),
            "username",
        )?;
        let Some((user, _)) = tables.users.iter_mut().find(|(u, _)| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(username) = username {
            user.username = username;
        }
        user.updated = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let mut tables = self.lock();
        let removed = remove_by_id(&mut tables.users, id, |(u, _)| u.id).map(|(u, _)| u);
        if removed.is_some() {
            tables.sessions.retain(|s| s.user_id != id);
            for post in tables.posts.iter_mut().filter(|p| p.user == Some(id)) {
                post.user = None;
            }
        }
        Ok(removed)
    }

    // --- SESSIONS ---

    async fn create_session(&self, session: NewSession) -> RepoResult<()> {
        let mut tables = self.lock();
        let now = Utc::now();
        tables.sessions.retain(|s| s.expires_at > now);
        tables.sessions.push(session);
        Ok(())
    }

    async fn get_session_user(&self, token_hash: &[u8]) -> RepoResult<Option<Uuid>> {
        let tables = self.lock();
        let now = Utc::now();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash && s.expires_at > now)
            .map(|s| s.user_id))
    }

    async fn delete_session(&self, token_hash: &[u8]) -> RepoResult<()> {
        let mut tables = self.lock();
        tables.sessions.retain(|s| s.token_hash != token_hash);
        Ok(())
    }

    // --- POSTS ---

    async fn list_posts(&self, page: Option<Page>) -> RepoResult<Vec<Post>> {
        Ok(window(&self.lock().posts, page))
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        Ok(self.lock().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_active_post_by_slug(&self, slug: &str) -> RepoResult<Option<Post>> {
        let slug = slug.trim();
        Ok(self
            .lock()
            .posts
            .iter()
            .find(|p| p.slug == slug && p.active == Some(true))
            .cloned())
    }

    async fn get_latest_posts(&self, limit: i64) -> RepoResult<Vec<Post>> {
        let tables = self.lock();
        Ok(tables
            .posts
            .iter()
            .rev()
            .filter(|p| p.active == Some(true))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn create_post(&self, req: CreatePostRequest, author: Uuid) -> RepoResult<Post> {
        let mut tables = self.lock();
        let slug = req.slug.trim().to_string();
        ensure_unique(&tables.posts, None, |p| p.id, |p| p.slug.as_str(), Some(&slug), "slug")?;
        let now = Utc::now();
        let record = Post {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            synopsis: trimmed(&req.synopsis),
            slug,
            content: trimmed(&req.content),
            hero: req.hero,
            category: req.category,
            active: req.active,
            user: Some(author),
            meta: trimmed(&req.meta),
            stars: None,
            readtime: req.readtime,
            views: None,
            created: now,
            updated: now,
        };
        tables.posts.push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> RepoResult<Option<Post>> {
        let mut tables = self.lock();
        let slug = trimmed(&req.slug);
        ensure_unique(
            &tables.posts,
            Some(id),
            |p| p.id,
            |p| p.slug.as_str(),
            slug.as_deref(),
            "slug",
        )?;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = trimmed(&req.title) {
            post.title = title;
        }
        if let Some(slug) = slug {
            post.slug = slug;
        }
        post.synopsis = trimmed(&req.synopsis).or(post.synopsis.take());
        post.content = trimmed(&req.content).or(post.content.take());
        post.meta = trimmed(&req.meta).or(post.meta.take());
        post.hero = req.hero.or(post.hero);
        post.active = req.active.or(post.active);
        post.readtime = req.readtime.or(post.readtime);
        if let Some(category) = req.category {
            post.category = category;
        }
        post.updated = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        Ok(remove_by_id(&mut self.lock().posts, id, |p| p.id))
    }

    // --- CATEGORIES ---

    async fn list_categories(&self, page: Option<Page>) -> RepoResult<Vec<Category>> {
        Ok(window(&self.lock().categories, page))
    }

    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        Ok(self.lock().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> RepoResult<Category> {
        let mut tables = self.lock();
        let name = req.name.trim().to_string();
        ensure_unique(
            &tables.categories,
            None,
            |c| c.id,
            |c| c.name.as_str(),
            Some(&name),
            "name",
        )?;
        let now = Utc::now();
        let record = Category {
            id: Uuid::new_v4(),
            name,
            description: trimmed(&req.description),
            created: now,
            updated: now,
        };
        tables.categories.push(record.clone());
        Ok(record)
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> RepoResult<Option<Category>> {
        let mut tables = self.lock();
        let name = trimmed(&req.name);
        ensure_unique(
            &tables.categories,
            Some(id),
            |c| c.id,
            |c| c.name.as_str(),
            name.as_deref(),
            "name",
        )?;
        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            category.name = name;
        }
        category.description = trimmed(&req.description).or(category.description.take());
        category.updated = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        Ok(remove_by_id(&mut self.lock().categories, id, |c| c.id))
    }

    // --- SUBSCRIBERS ---

    async fn list_subscribers(&self, page: Option<Page>) -> RepoResult<Vec<Subscriber>> {
        Ok(window(&self.lock().subscribers, page))
    }

    async fn get_subscriber(&self, id: Uuid) -> RepoResult<Option<Subscriber>> {
        Ok(self.lock().subscribers.iter().find(|s| s.id == id).cloned())
    }

    async fn create_subscriber(&self, req: CreateSubscriberRequest) -> RepoResult<Subscriber> {
        let mut tables = self.lock();
        let email = req.email.trim().to_string();
        ensure_unique(
            &tables.subscribers,
            None,
            |s| s.id,
            |s| s.email.as_str(),
            Some(&email),
            "email",
        )?;
        let now = Utc::now();
        let record = Subscriber {
            id: Uuid::new_v4(),
            email,
            name: trimmed(&req.name),
            subscribed: req.subscribed,
            created: now,
            updated: now,
        };
        tables.subscribers.push(record.clone());
        Ok(record)
    }

    async fn update_subscriber(
        &self,
        id: Uuid,
        req: UpdateSubscriberRequest,
    ) -> RepoResult<Option<Subscriber>> {
        let mut tables = self.lock();
        let email = trimmed(&req.email);
        ensure_unique(
            &tables.subscribers,
            Some(id),
            |s| s.id,
            |s| s.email.as_str(),
            email.as_deref(),
            "email",
        )?;
        let Some(subscriber) = tables.subscribers.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(email) = email {
            subscriber.email = email;
        }
        subscriber.name = trimmed(&req.name).or(subscriber.name.take());
        subscriber.subscribed = req.subscribed.or(subscriber.subscribed);
        subscriber.updated = Utc::now();
        Ok(Some(subscriber.clone()))
    }

    async fn delete_subscriber(&self, id: Uuid) -> RepoResult<Option<Subscriber>> {
        Ok(remove_by_id(&mut self.lock().subscribers, id, |s| s.id))
    }

    // --- GALLERY ---

    async fn list_gallery(&self, page: Option<Page>) -> RepoResult<Vec<GalleryItem>> {
        Ok(window(&self.lock().gallery, page))
    }

    async fn get_gallery_item(&self, id: Uuid) -> RepoResult<Option<GalleryItem>> {
        Ok(self.lock().gallery.iter().find(|g| g.id == id).cloned())
    }

    async fn create_gallery_item(&self, req: CreateGalleryItemRequest) -> RepoResult<GalleryItem> {
        let mut tables = self.lock();
        let filename = req.filename.trim().to_string();
        ensure_unique(
            &tables.gallery,
            None,
            |g| g.id,
            |g| g.filename.as_str(),
            Some(&filename),
            "filename",
        )?;
        let now = Utc::now();
        let record = GalleryItem {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            filename,
            path: trimmed(&req.path),
            thumbnail: trimmed(&req.thumbnail),
            tags: trimmed_tags(&req.tags),
            created: now,
            updated: now,
        };
        tables.gallery.push(record.clone());
        Ok(record)
    }

    async fn update_gallery_item(
        &self,
        id: Uuid,
        req: UpdateGalleryItemRequest,
    ) -> RepoResult<Option<GalleryItem>> {
        let mut tables = self.lock();
        let Some(item) = tables.gallery.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(name) = trimmed(&req.name) {
            item.name = name;
        }
        if let Some(tags) = req.tags.as_deref() {
            item.tags = trimmed_tags(tags);
        }
        item.updated = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete_gallery_item(&self, id: Uuid) -> RepoResult<Option<GalleryItem>> {
        let mut tables = self.lock();
        let removed = remove_by_id(&mut tables.gallery, id, |g| g.id);
        if removed.is_some() {
            for post in tables.posts.iter_mut().filter(|p| p.hero == Some(id)) {
                post.hero = None;
            }
        }
        Ok(removed)
    }
}
