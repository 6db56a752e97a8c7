use chrono::{Duration, Utc};
use inkwell_api::{
    PostgresRepository,
    models::{
        CreateCategoryRequest, CreateGalleryItemRequest, CreatePostRequest,
        CreateSubscriberRequest, NewSession, NewUser, Page, UpdatePostRequest,
        UpdateSubscriberRequest,
    },
    repository::{Repository, RepositoryError},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

/// Holds the pool for a database-backed run. Tests return early when no
/// `DATABASE_URL` is configured, so the suite stays green on machines without Postgres.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres repository test");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        PostgresRepository::new(pool.clone())
            .migrate()
            .await
            .expect("Failed to run database migrations.");

        Some(DbTestContext { pool })
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Tables are shared between runs, so every unique value carries a fresh suffix.
fn unique(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

fn new_user() -> NewUser {
    let username = unique("user");
    NewUser {
        email: format!("{username}@example.com"),
        username,
        password_hash: "$argon2id$placeholder".to_string(),
    }
}

fn new_post(slug: &str, active: bool) -> CreatePostRequest {
    CreatePostRequest {
        title: format!("Title {slug}"),
        slug: slug.to_string(),
        active: Some(active),
        ..Default::default()
    }
}

// --- Tests ---

#[tokio::test]
async fn test_create_then_fetch_category() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let name = unique("cat");

    let created = repo
        .create_category(CreateCategoryRequest {
            name: format!("  {name} "),
            description: Some(" Systems ".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(created.name, name);
    assert_eq!(created.description.as_deref(), Some("Systems"));

    let fetched = repo.get_category(created.id).await.unwrap();
    assert_eq!(fetched, Some(created.clone()));

    let removed = repo.delete_category(created.id).await.unwrap();
    assert_eq!(removed.map(|c| c.id), Some(created.id));
    assert_eq!(repo.get_category(created.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_list_without_page_returns_every_row_in_creation_order() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let sub = repo
            .create_subscriber(CreateSubscriberRequest {
                email: format!("{}@example.com", unique("reader")),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(sub.id);
    }

    let listed: Vec<Uuid> = repo
        .list_subscribers(None)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .filter(|id| ids.contains(id))
        .collect();
    assert_eq!(listed, ids);

    let window = repo
        .list_subscribers(Some(Page { number: 1, size: 2 }))
        .await
        .unwrap();
    assert!(window.len() <= 2);

    let beyond = repo
        .list_subscribers(Some(Page {
            number: 1_000_000,
            size: 1_000,
        }))
        .await
        .unwrap();
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn test_partial_update_keeps_unsupplied_fields() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let email = format!("{}@example.com", unique("reader"));

    let sub = repo
        .create_subscriber(CreateSubscriberRequest {
            email: email.clone(),
            name: Some("Reader".to_string()),
            subscribed: Some(true),
        })
        .await
        .unwrap();

    let updated = repo
        .update_subscriber(
            sub.id,
            UpdateSubscriberRequest {
                subscribed: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("subscriber should exist");

    assert_eq!(updated.email, email);
    assert_eq!(updated.name.as_deref(), Some("Reader"));
    assert_eq!(updated.subscribed, Some(false));
    assert_eq!(updated.created, sub.created);
    assert!(updated.updated >= sub.updated);

    assert_eq!(
        repo.update_subscriber(Uuid::new_v4(), UpdateSubscriberRequest::default())
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_post_arrays_and_partial_update() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let author = repo.create_user(new_user()).await.unwrap();
    let categories = vec![Uuid::new_v4(), Uuid::new_v4()];
    let slug = unique("post-");

    let post = repo
        .create_post(
            CreatePostRequest {
                synopsis: Some("short".to_string()),
                category: categories.clone(),
                readtime: Some(4),
                ..new_post(&slug, false)
            },
            author.id,
        )
        .await
        .unwrap();
    assert_eq!(post.category, categories);
    assert_eq!(post.user, Some(author.id));

    let updated = repo
        .update_post(
            post.id,
            UpdatePostRequest {
                title: Some("Renamed".to_string()),
                active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("post should exist");

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.active, Some(true));
    assert_eq!(updated.slug, slug);
    assert_eq!(updated.synopsis.as_deref(), Some("short"));
    assert_eq!(updated.category, categories);
    assert_eq!(updated.readtime, Some(4));

    let by_slug = repo.get_active_post_by_slug(&slug).await.unwrap();
    assert_eq!(by_slug.map(|p| p.id), Some(post.id));

    let latest = repo.get_latest_posts(1).await.unwrap();
    assert_eq!(latest.len(), 1);
}

#[tokio::test]
async fn test_unique_constraints_map_to_duplicate_fields() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let author = repo.create_user(new_user()).await.unwrap();

    let slug = unique("dup-");
    repo.create_post(new_post(&slug, true), author.id)
        .await
        .unwrap();
    assert!(matches!(
        repo.create_post(new_post(&slug, true), author.id).await,
        Err(RepositoryError::Duplicate(field)) if field == "slug"
    ));

    let clash = NewUser {
        email: author.email.clone(),
        ..new_user()
    };
    assert!(matches!(
        repo.create_user(clash).await,
        Err(RepositoryError::Duplicate(field)) if field == "email"
    ));

    let filename = format!("gallery/{}.png", unique("img"));
    let item = CreateGalleryItemRequest {
        name: "cover".to_string(),
        filename: filename.clone(),
        tags: vec![" hero ".to_string(), " ".to_string()],
        ..Default::default()
    };
    let created = repo.create_gallery_item(item.clone()).await.unwrap();
    assert_eq!(created.tags, vec!["hero"]);
    assert!(matches!(
        repo.create_gallery_item(item).await,
        Err(RepositoryError::Duplicate(field)) if field == "filename"
    ));
}

#[tokio::test]
async fn test_session_expiry_and_revocation() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = repo.create_user(new_user()).await.unwrap();

    let live = Uuid::new_v4().as_bytes().to_vec();
    let expired = Uuid::new_v4().as_bytes().to_vec();
    repo.create_session(NewSession {
        token_hash: live.clone(),
        user_id: user.id,
        expires_at: Utc::now() + Duration::minutes(5),
    })
    .await
    .unwrap();
    repo.create_session(NewSession {
        token_hash: expired.clone(),
        user_id: user.id,
        expires_at: Utc::now() - Duration::seconds(1),
    })
    .await
    .unwrap();

    assert_eq!(repo.get_session_user(&live).await.unwrap(), Some(user.id));
    assert_eq!(repo.get_session_user(&expired).await.unwrap(), None);

    repo.delete_session(&live).await.unwrap();
    assert_eq!(repo.get_session_user(&live).await.unwrap(), None);
    repo.delete_session(&live).await.unwrap();
}

#[tokio::test]
async fn test_deleting_a_user_drops_sessions_and_clears_authorship() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let user = repo.create_user(new_user()).await.unwrap();
    let post = repo
        .create_post(new_post(&unique("owned-"), true), user.id)
        .await
        .unwrap();
    let token_hash = Uuid::new_v4().as_bytes().to_vec();
    repo.create_session(NewSession {
        token_hash: token_hash.clone(),
        user_id: user.id,
        expires_at: Utc::now() + Duration::minutes(5),
    })
    .await
    .unwrap();

    let removed = repo.delete_user(user.id).await.unwrap();
    assert_eq!(removed.map(|u| u.id), Some(user.id));

    assert_eq!(repo.get_session_user(&token_hash).await.unwrap(), None);
    let orphaned = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(orphaned.user, None);
}

#[tokio::test]
async fn test_hero_is_a_soft_reference_cleared_on_gallery_delete() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let author = repo.create_user(new_user()).await.unwrap();

    let dangling = repo
        .create_post(
            CreatePostRequest {
                hero: Some(Uuid::new_v4()),
                ..new_post(&unique("dangling-"), true)
            },
            author.id,
        )
        .await
        .unwrap();
    assert!(dangling.hero.is_some());

    let item = repo
        .create_gallery_item(CreateGalleryItemRequest {
            name: "cover".to_string(),
            filename: format!("gallery/{}.png", unique("hero")),
            ..Default::default()
        })
        .await
        .unwrap();
    let post = repo
        .create_post(
            CreatePostRequest {
                hero: Some(item.id),
                ..new_post(&unique("pictured-"), true)
            },
            author.id,
        )
        .await
        .unwrap();

    repo.delete_gallery_item(item.id).await.unwrap();
    let post = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(post.hero, None);
    assert_eq!(repo.get_gallery_item(item.id).await.unwrap(), None);
}
