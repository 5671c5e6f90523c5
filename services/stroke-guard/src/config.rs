use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub login_requests_per_minute: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImportConfig {
    pub dataset_path: String,
    pub owner_username: String,
    pub progress_interval: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", 4)?
            // Database defaults
            .set_default("database.url", "sqlite://stroke_guard.db")?
            .set_default("database.max_connections", 5)?
            // Auth defaults
            .set_default("auth.jwt_secret", "change-me-in-production-please")?
            .set_default("auth.token_ttl_minutes", 480)?
            .set_default("auth.login_requests_per_minute", 30)?
            // Bulk import defaults
            .set_default("import.dataset_path", "healthcare-dataset-stroke-data.csv")?
            .set_default("import.owner_username", "admin")?
            .set_default("import.progress_interval", 100)?;

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        builder = builder.add_source(Environment::with_prefix("STROKE_GUARD").separator("__"));

        if let Ok(port) = env::var("SERVICE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(db_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", db_url)?;
        }

        if let Ok(secret) = env::var("JWT_SECRET") {
            builder = builder.set_override("auth.jwt_secret", secret)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL is required".to_string());
        }

        if self.auth.jwt_secret.len() < 16 {
            return Err("JWT secret must be at least 16 bytes".to_string());
        }

        if self.auth.token_ttl_minutes <= 0 {
            return Err("Token TTL must be positive".to_string());
        }

        if self.auth.login_requests_per_minute == 0 {
            return Err("Login rate limit cannot be 0".to_string());
        }

        if self.import.progress_interval == 0 {
            return Err("Import progress interval cannot be 0".to_string());
        }

        Ok(())
    }
}
