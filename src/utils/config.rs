use chrono::Duration;
use std::env;
use std::path::PathBuf;

use crate::models::catalog::{Catalog, ClassRoster};
use crate::services::auth_service::AdminCredentials;

pub const DEFAULT_SECRET_KEY: &str = "change-me";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 30;

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub data_file: PathBuf,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_password_hash: Option<String>,
    pub session_timeout: Duration,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub environment: String,
    pub catalog: Catalog,
    pub classes: ClassRoster,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            data_file: PathBuf::from("data_seragam_gui.json"),
            admin_username: "admin".to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            admin_password_hash: None,
            session_timeout: Duration::minutes(DEFAULT_SESSION_TIMEOUT_MINUTES),
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            environment: "development".to_string(),
            catalog: Catalog::default(),
            classes: ClassRoster::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        let defaults = Config::default();

        let session_minutes = match env::var("SESSION_TIMEOUT_MINUTES") {
            Ok(value) => value.parse::<i64>().map_err(|_| {
                anyhow::anyhow!("SESSION_TIMEOUT_MINUTES must be a whole number of minutes")
            })?,
            Err(_) => DEFAULT_SESSION_TIMEOUT_MINUTES,
        };
        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid port number"))?,
            Err(_) => defaults.port,
        };

        let config = Config {
            secret_key: env::var("SECRET_KEY").unwrap_or(defaults.secret_key),
            data_file: env::var("DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH").ok(),
            session_timeout: Duration::minutes(session_minutes),
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            environment: env::var("APP_ENV").unwrap_or(defaults.environment),
            catalog: defaults.catalog,
            classes: defaults.classes,
        };

        tracing::info!("Config: successfully loaded for {} environment", config.environment);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.session_timeout <= Duration::zero() {
            return Err(anyhow::anyhow!("SESSION_TIMEOUT_MINUTES must be positive"));
        }

        if self.admin_username.is_empty() {
            return Err(anyhow::anyhow!("ADMIN_USERNAME is not set"));
        }

        if self.secret_key.is_empty() {
            return Err(anyhow::anyhow!("SECRET_KEY is not set"));
        }

        if self.is_production() && self.secret_key == DEFAULT_SECRET_KEY {
            return Err(anyhow::anyhow!("SECRET_KEY is not set in production"));
        }

        if self.is_production()
            && self.admin_password_hash.is_none()
            && self.admin_password == DEFAULT_ADMIN_PASSWORD
        {
            return Err(anyhow::anyhow!(
                "ADMIN_PASSWORD or ADMIN_PASSWORD_HASH must be set in production"
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Uses the configured hash as is, otherwise hashes the plaintext password.
    pub fn admin_credentials(&self) -> anyhow::Result<AdminCredentials> {
        match &self.admin_password_hash {
            Some(hash) => Ok(AdminCredentials::new(&self.admin_username, hash)),
            None => Ok(AdminCredentials::from_password(
                &self.admin_username,
                &self.admin_password,
                bcrypt::DEFAULT_COST,
            )?),
        }
    }
}
