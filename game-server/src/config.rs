use std::env;

use game_core::DEFAULT_SECONDARY_PREFIX;
use game_persistence::connection::DEFAULT_DATABASE_URL;

pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub words_file: Option<String>,
    pub secondary_identity_prefix: String,
    pub pin_cleanup_interval_seconds: u64,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub dev_mode: bool,
    pub project_id: String,
    pub jwks_url: String,
    pub issuer: String,
}

impl Config {
    pub fn new() -> Self {
        let project_id = env::var("AUTH_PROJECT_ID").unwrap_or_else(|_| "wordle-dev".to_string());

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            words_file: env::var("WORDS_FILE").ok().filter(|path| !path.is_empty()),
            secondary_identity_prefix: env::var("SECONDARY_IDENTITY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_SECONDARY_PREFIX.to_string()),
            pin_cleanup_interval_seconds: env::var("PIN_CLEANUP_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("Invalid PIN_CLEANUP_INTERVAL_SECONDS"),
            auth: AuthConfig {
                dev_mode: env::var("AUTH_DEV_MODE").unwrap_or_else(|_| "false".to_string())
                    == "true",
                jwks_url: env::var("AUTH_JWKS_URL").unwrap_or_else(|_| DEFAULT_JWKS_URL.to_string()),
                issuer: env::var("AUTH_ISSUER")
                    .unwrap_or_else(|_| format!("https://securetoken.google.com/{}", project_id)),
                project_id,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
