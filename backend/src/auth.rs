use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    config::{AppConfig, BootstrapUser},
    error::ApiError,
    models::{LoginRequest, NewSession, NewUser},
    repository::RepositoryState,
};

pub const SESSION_COOKIE_NAME: &str = "sid";
pub const LOGIN_FAILED_MESSAGE: &str = "Username or password invalid";

// --- Passwords ---

/// Hashes a password into an Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {}", e);
            ApiError::Internal("Unable to store the password".to_string())
        })
}

/// Checks a password against a stored PHC string. A malformed hash never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Stand-in hash checked when the username is unknown, so that path costs the same
/// Argon2 run as a wrong password.
static DUMMY_PASSWORD_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("inkwell-no-such-user").ok());

pub fn dummy_password_hash() -> Option<&'static str> {
    DUMMY_PASSWORD_HASH.as_deref()
}

// --- Session Tokens ---

/// 256 random bits, URL-safe base64. This is the only copy of the token; the store
/// keeps `hash_session_token` of it.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_session_token(token: &str, secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Reads the session token from the `Cookie` header(s), if any.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

// --- Cookies ---

fn cookie_header(value: String) -> Result<HeaderValue, ApiError> {
    HeaderValue::try_from(value).map_err(|e| {
        tracing::error!("invalid Set-Cookie value: {}", e);
        ApiError::Internal("Unable to set the session cookie".to_string())
    })
}

/// `Set-Cookie` for a fresh session. `Secure` is only added in production so that
/// plain-http local frontends keep working.
pub fn session_cookie(token: &str, config: &AppConfig) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session_ttl_seconds
    );
    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }
    cookie_header(cookie)
}

/// `Set-Cookie` that expires the session cookie in the browser.
pub fn clear_session_cookie(config: &AppConfig) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }
    cookie_header(cookie)
}

// --- Login / Logout ---

/// login
///
/// Verifies the credentials and opens a server-side session. Returns the raw token
/// for the cookie. Unknown usernames and wrong passwords fail the same way.
pub async fn login(
    repo: &RepositoryState,
    config: &AppConfig,
    req: &LoginRequest,
) -> Result<String, ApiError> {
    let credentials = repo.get_credentials(&req.username).await?;
    let Some(credentials) = credentials else {
        if let Some(hash) = dummy_password_hash() {
            verify_password(&req.password, hash);
        }
        tracing::info!(username = %req.username.trim(), "login rejected: unknown user");
        return Err(ApiError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()));
    };
    if !verify_password(&req.password, &credentials.password_hash) {
        tracing::info!(username = %credentials.username, "login rejected: bad password");
        return Err(ApiError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()));
    }

    let token = generate_session_token();
    repo.create_session(NewSession {
        token_hash: hash_session_token(&token, &config.session_secret),
        user_id: credentials.id,
        expires_at: Utc::now() + Duration::seconds(config.session_ttl_seconds),
    })
    .await?;

    tracing::info!(user_id = %credentials.id, "session opened");
    Ok(token)
}

/// Ends the session named by the request cookie. Missing or stale cookies are a no-op.
pub async fn logout(
    repo: &RepositoryState,
    config: &AppConfig,
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    if let Some(token) = extract_session_token(headers) {
        repo.delete_session(&hash_session_token(&token, &config.session_secret))
            .await?;
    }
    Ok(())
}

/// Creates the configured bootstrap account unless that username already exists.
pub async fn ensure_bootstrap_user(
    repo: &RepositoryState,
    user: &BootstrapUser,
) -> Result<(), ApiError> {
    if repo.get_credentials(&user.username).await?.is_some() {
        tracing::debug!(username = %user.username, "bootstrap user already present");
        return Ok(());
    }
    let created = repo
        .create_user(NewUser {
            email: user.email.clone(),
            username: user.username.clone(),
            password_hash: hash_password(&user.password)?,
        })
        .await?;
    tracing::info!(user_id = %created.id, username = %created.username, "bootstrap user created");
    Ok(())
}

// --- Extractor ---

/// AuthUser
///
/// The user behind the request's session cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Resolves the `sid` cookie to a live session and its user.
///
/// Rejection: 401 `{ message: "Authentication required", success: false }` when the
/// cookie is missing, unknown, expired, or its user has been deleted.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = extract_session_token(&parts.headers).ok_or_else(ApiError::auth_required)?;
        let token_hash = hash_session_token(&token, &config.session_secret);

        let user_id = repo
            .get_session_user(&token_hash)
            .await?
            .ok_or_else(ApiError::auth_required)?;

        // The user may have been deleted after the session was issued.
        let user = repo
            .get_user(user_id)
            .await?
            .ok_or_else(ApiError::auth_required)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
