use std::env;
use std::path::PathBuf;

use chrono::NaiveTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Metrics store
    pub database_url: String,

    // Collaborators
    pub catalog_database_url: String,
    pub readings_root: PathBuf,

    // Schedule
    pub schedule_time: NaiveTime,
    pub run_on_startup: bool,
    pub retry_max: u32,
    pub retry_delay_seconds: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set,
    /// or `ConfigError::Invalid` if `SCHEDULE_TIME` is not `HH:MM`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            catalog_database_url: env::var("CATALOG_DATABASE_URL")
                .unwrap_or_else(|_| database_url.clone()),
            database_url,

            readings_root: env::var("READINGS_ROOT")
                .map(PathBuf::from)
                .map_err(|_| ConfigError::Missing("READINGS_ROOT"))?,

            // Schedule (30 12 * * *, UTC)
            schedule_time: parse_schedule_time(
                &env::var("SCHEDULE_TIME").unwrap_or_else(|_| "12:30".to_string()),
            )?,
            run_on_startup: env::var("RUN_ON_STARTUP")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            retry_max: env::var("PIPELINE_RETRY_MAX")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            retry_delay_seconds: env::var("PIPELINE_RETRY_DELAY_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Parse a daily fire time given as `HH:MM` (24h).
///
/// # Errors
///
/// Returns `ConfigError::Invalid` for anything else.
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::Invalid("SCHEDULE_TIME", value.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
