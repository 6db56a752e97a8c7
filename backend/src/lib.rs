use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;
pub mod validation;

// Public and authenticated route groups.
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and the request/response schemas into the
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login::login, handlers::login::logout, handlers::login::is_authenticated,
        handlers::front::get_latest_posts, handlers::front::get_post_by_slug,
        handlers::users::list_users, handlers::users::get_user, handlers::users::create_user,
        handlers::users::update_user, handlers::users::delete_user,
        handlers::posts::list_posts, handlers::posts::get_post, handlers::posts::create_post,
        handlers::posts::update_post, handlers::posts::delete_post,
        handlers::categories::list_categories, handlers::categories::get_category,
        handlers::categories::create_category, handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::subscribers::list_subscribers, handlers::subscribers::get_subscriber,
        handlers::subscribers::create_subscriber, handlers::subscribers::update_subscriber,
        handlers::subscribers::delete_subscriber,
        handlers::gallery::list_gallery, handlers::gallery::get_gallery_item,
        handlers::gallery::create_gallery_item, handlers::gallery::update_gallery_item,
        handlers::gallery::delete_gallery_item, handlers::gallery::request_upload_url,
    ),
    components(
        schemas(
            models::User, models::Post, models::Category, models::Subscriber,
            models::GalleryItem, models::LoginRequest, models::CreateUserRequest,
            models::UpdateUserRequest, models::CreatePostRequest, models::UpdatePostRequest,
            models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreateSubscriberRequest, models::UpdateSubscriberRequest,
            models::CreateGalleryItemRequest, models::UpdateGalleryItemRequest,
            models::UploadRequest, models::UploadResponse, models::MessageResponse,
            models::FieldError, models::ValidationErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Session login, logout and probe"),
        (name = "front", description = "Public post reads"),
        (name = "users", description = "Back-office accounts"),
        (name = "posts", description = "Blog posts"),
        (name = "categories", description = "Post categories"),
        (name = "subscribers", description = "Newsletter subscribers"),
        (name = "gallery", description = "Media gallery"),
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single, cloneable container of shared services. Handlers take it whole via
/// `State<AppState>`; extractors pull single slices through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: Postgres, or the in-memory store for local runs and tests.
    pub repo: RepositoryState,
    /// Media bucket for gallery files.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated route group. Extracting `AuthUser` resolves the session
/// cookie; when that fails the extractor's 401 rejection is returned and the handler
/// never runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// CORS for a browser frontend that sends the session cookie. Credentialed requests
/// can't use a wildcard, so only the configured origin(s) are allowed.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origin
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// create_router
///
/// Assembles the public and authenticated route groups, the API docs, and the
/// observability and security layers, then binds the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // `route_layer` only runs the guard for matched routes, so unknown paths
        // still answer 404 instead of 401.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // Baseline hardening headers, unless a handler already set them.
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("off"),
        ))
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span with method, URI and the `x-request-id`, so every log line
/// of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
