use crate::{
    AppState,
    handlers::{categories, gallery, posts, subscribers, users},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// The back-office CRUD surface. `create_router` wraps this whole router in the session
/// middleware, so handlers here may assume a resolved `AuthUser`.
///
/// Each resource follows the same shape:
/// `GET /api/<resource>`, `POST /api/<resource>`,
/// `GET|PUT|DELETE /api/<resource>/{id}`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Users ---
        .route("/api/user", get(users::list_users).post(users::create_user))
        .route(
            "/api/user/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // --- Posts ---
        // Creating a post records the session user as its author.
        .route("/api/post", get(posts::list_posts).post(posts::create_post))
        .route(
            "/api/post/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        // --- Categories ---
        .route(
            "/api/category",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/category/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        // --- Subscribers ---
        .route(
            "/api/subscriber",
            get(subscribers::list_subscribers).post(subscribers::create_subscriber),
        )
        .route(
            "/api/subscriber/{id}",
            get(subscribers::get_subscriber)
                .put(subscribers::update_subscriber)
                .delete(subscribers::delete_subscriber),
        )
        // --- Gallery ---
        // POST /api/gallery/upload
        // Presigned PUT URL for a direct browser-to-bucket upload (10-minute expiry).
        .route("/api/gallery/upload", post(gallery::request_upload_url))
        .route(
            "/api/gallery",
            get(gallery::list_gallery).post(gallery::create_gallery_item),
        )
        .route(
            "/api/gallery/{id}",
            get(gallery::get_gallery_item)
                .put(gallery::update_gallery_item)
                .delete(gallery::delete_gallery_item),
        )
}
