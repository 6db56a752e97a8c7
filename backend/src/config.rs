use std::env;

use thiserror::Error;

/// AppConfig
///
/// Holds the application's entire configuration state. The struct is immutable once loaded
/// and is pulled into handlers and extractors from the shared `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls cookie security and the log format.
    pub env: Env,
    // Postgres connection string. Optional in local mode, where the in-memory store is used.
    pub db_url: Option<String>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Pepper mixed into the stored session token hashes.
    pub session_secret: String,
    // Lifetime of a login session, also used as the cookie Max-Age.
    pub session_ttl_seconds: i64,
    // The single frontend origin allowed to make credentialed CORS requests.
    pub cors_origin: String,
    // Number of records per page when a list request carries `?page=`.
    pub page_size: i64,
    // Number of posts returned by the public "latest posts" endpoint.
    pub latest_posts_limit: i64,
    // S3-compatible storage for gallery media (MinIO in local).
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    pub s3_bucket: String,
    // Optional account created at startup so a fresh store can be logged into.
    pub bootstrap_user: Option<BootstrapUser>,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (in-memory store, MinIO defaults, plain cookies) and hardened production settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// Credentials of the account seeded at startup (`BOOTSTRAP_*` variables).
#[derive(Clone, Debug)]
pub struct BootstrapUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

const LOCAL_SESSION_SECRET: &str = "inkwell-local-session-secret";

impl Default for AppConfig {
    /// Safe, non-panicking values used for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            bind_addr: "0.0.0.0:3000".to_string(),
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_ttl_seconds: 86_400,
            cors_origin: "http://localhost:4200".to_string(),
            page_size: 20,
            latest_posts_limit: 10,
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "inkwell-media".to_string(),
            bootstrap_user: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production is fail-fast:
    /// every secret without a safe default must be present, otherwise a `ConfigError`
    /// names the first missing variable.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };
        let defaults = Self::default();

        let bootstrap_user = match (
            env::var("BOOTSTRAP_USERNAME"),
            env::var("BOOTSTRAP_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => Some(BootstrapUser {
                email: env::var("BOOTSTRAP_EMAIL")
                    .unwrap_or_else(|_| format!("{username}@localhost.localdomain")),
                username,
                password,
            }),
            _ => None,
        };

        let common = Self {
            env: env.clone(),
            db_url: env::var("DATABASE_URL").ok(),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_secret: env::var("SESSION_SECRET").unwrap_or(defaults.session_secret),
            session_ttl_seconds: parse_number("SESSION_TTL_SECONDS", defaults.session_ttl_seconds)?,
            cors_origin: env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            page_size: parse_number("PAGE_SIZE", defaults.page_size)?,
            latest_posts_limit: parse_number("LATEST_POSTS_LIMIT", defaults.latest_posts_limit)?,
            s3_endpoint: env::var("S3_ENDPOINT").unwrap_or(defaults.s3_endpoint),
            s3_region: env::var("S3_REGION").unwrap_or(defaults.s3_region),
            s3_key: env::var("S3_ACCESS_KEY").unwrap_or(defaults.s3_key),
            s3_secret: env::var("S3_SECRET_KEY").unwrap_or(defaults.s3_secret),
            s3_bucket: env::var("S3_BUCKET_NAME").unwrap_or(defaults.s3_bucket),
            bootstrap_user,
        };

        match env {
            Env::Local => Ok(common),
            Env::Production => Ok(Self {
                db_url: Some(required("DATABASE_URL")?),
                session_secret: required("SESSION_SECRET")?,
                s3_endpoint: required("S3_ENDPOINT")?,
                s3_key: required("S3_ACCESS_KEY")?,
                s3_secret: required("S3_SECRET_KEY")?,
                ..common
            }),
        }
    }

    /// Session cookies carry the `Secure` flag only in production.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_number(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().parse::<i64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
    }
}
