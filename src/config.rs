use std::{env, path::PathBuf};

/// Fallback signing secret for session tokens outside production.
pub const LOCAL_JWT_SECRET: &str = "course-portal-local-session-secret";

/// AppConfig
///
/// The portal's configuration, read once at startup and shared read-only
/// through the application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the demo-token bypass and log format.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Directory holding the JSON fixtures (users.json, courses.json, ...).
    pub data_dir: PathBuf,
    // Secret used to verify session JWTs carried in the `auth_token` cookie.
    pub jwt_secret: String,
    // Optional JSON document replacing the built-in route rules.
    pub policy_file: Option<PathBuf>,
}

/// Env
///
/// Local enables the development login and demo tokens; Production only
/// trusts signed session tokens.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Test configuration. Needs no environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:0".to_string(),
            data_dir: PathBuf::from("data"),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            policy_file: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment.
    ///
    /// # Panics
    /// Panics in production when `SESSION_JWT_SECRET` is unset, so the portal
    /// never starts verifying sessions against a well-known secret.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("SESSION_JWT_SECRET")
                .expect("FATAL: SESSION_JWT_SECRET must be set in production."),
            Env::Local => {
                env::var("SESSION_JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string())
            }
        };

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            jwt_secret,
            policy_file: env::var("ACCESS_POLICY_FILE")
                .ok()
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        }
    }
}
