use crate::{
    AppState,
    handlers::{front, login},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. The front routes only ever expose active posts;
/// that filter lives in the repository query.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/login
        // Opens a session and sets the `sid` cookie.
        .route("/api/login", post(login::login))
        // POST /api/logout
        // Ends the session named by the cookie and expires the cookie.
        .route("/api/logout", post(login::logout))
        // GET /api/isauthenticated
        // 200 when the cookie resolves to a live session, 401 otherwise.
        .route("/api/isauthenticated", get(login::is_authenticated))
        // GET /api/get/post/latest
        // Newest active posts. Registered before `{slug}`; the static segment wins either way.
        .route("/api/get/post/latest", get(front::get_latest_posts))
        // GET /api/get/post/{slug}
        .route("/api/get/post/{slug}", get(front::get_post_by_slug))
}
