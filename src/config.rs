use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. It is loaded once at startup,
/// never mutated afterwards, and pulled into handlers and extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection URL. The file is created on first start if it is missing.
    pub database_url: String,
    // Upper bound on pooled SQLite connections.
    pub database_max_connections: u32,
    // Runtime environment marker. Controls log format and secret requirements.
    pub env: Env,
    // HS256 key used both to sign tokens at login and to validate bearer credentials.
    pub jwt_secret: String,
    // Lifetime of issued tokens, in seconds.
    pub jwt_ttl_secs: u64,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context: pretty logs and a fallback secret locally, JSON logs
/// and mandatory secrets in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "recipe-api-local-development-secret";
const DEFAULT_DATABASE_URL: &str = "sqlite://db.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_JWT_TTL_SECS: u64 = 60 * 60 * 24;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

impl Default for AppConfig {
    /// Safe, non-panicking configuration for test scaffolding. Points at an in-memory store.
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_ttl_secs: DEFAULT_JWT_TTL_SECS,
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the environment.
    ///
    /// # Panics
    /// Panics when `APP_ENV=production` and `JWT_SECRET` is not set, or when a numeric
    /// variable is present but unparsable. The service must not start half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            env,
            jwt_secret,
            jwt_ttl_secs: parse_var("JWT_TTL_SECS").unwrap_or(DEFAULT_JWT_TTL_SECS),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => panic!("FATAL: {key} has an invalid value: {raw}"),
    }
}
