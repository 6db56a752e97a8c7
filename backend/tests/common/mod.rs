#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use inkwell_api::{
    AppConfig, AppState, InMemoryRepository, MockStorageService, create_router,
    auth::hash_password,
    models::{NewUser, User},
    repository::RepositoryState,
    storage::StorageState,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const TEST_USERNAME: &str = "editor01";
pub const TEST_PASSWORD: &str = "correct-horse";
pub const TEST_EMAIL: &str = "editor01@example.com";

/// Test wiring: in-memory store, mock media bucket, default local config.
pub struct TestContext {
    pub state: AppState,
    pub storage: MockStorageService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_storage(MockStorageService::new())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
        let state = AppState {
            repo,
            storage: Arc::new(storage.clone()) as StorageState,
            config: AppConfig::default(),
        };
        Self { state, storage }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Inserts the standard login account.
    pub async fn seed_user(&self) -> User {
        self.state
            .repo
            .create_user(NewUser {
                email: TEST_EMAIL.to_string(),
                username: TEST_USERNAME.to_string(),
                password_hash: hash_password(TEST_PASSWORD).unwrap(),
            })
            .await
            .unwrap()
    }

    /// Seeds the account, logs in through the router and returns the `sid=<token>` pair.
    pub async fn login_cookie(&self) -> String {
        self.seed_user().await;
        let response = send(
            self.router(),
            json_request(
                "POST",
                "/api/login",
                serde_json::json!({ "username": TEST_USERNAME, "password": TEST_PASSWORD }),
            ),
        )
        .await;
        session_pair(&response).expect("login should set the session cookie")
    }
}

/// The `name=value` part of the response's `Set-Cookie` header.
pub fn session_pair(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serves the router on an ephemeral port and returns its base URL.
pub async fn spawn_app(state: AppState) -> String {
    let router = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}
