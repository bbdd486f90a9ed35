//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use std::collections::HashSet;

use serde::Deserialize;

use crate::data::{Account, Server, Sns};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub timeline: TimelineConfig,
    pub streaming: StreamingConfig,
    pub logging: LoggingConfig,
    /// Session accounts, in selection order
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent to every server
    pub user_agent: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

/// Timeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineConfig {
    /// Statuses requested per page (default: 20, max 40)
    pub page_size: usize,
}

/// Streaming configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    /// Subscribe to the user stream after the initial load
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

/// A configured session account
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub username: String,
    /// Server domain (e.g., "social.example.com")
    pub domain: String,
    /// Base URL; defaults to https://<domain>
    pub base_url: Option<String>,
    #[serde(default)]
    pub sns: Sns,
    pub access_token: String,
}

impl AccountConfig {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.domain))
            .trim_end_matches('/')
            .to_string()
    }

    /// Session account and server pair
    pub fn to_session(&self) -> (Account, Server) {
        let account = Account {
            username: self.username.clone(),
            acct: self.username.clone(),
            display_name: self.username.clone(),
            access_token: Some(self.access_token.clone()),
            ..Default::default()
        };
        let server = Server {
            domain: self.domain.clone(),
            base_url: self.base_url(),
            sns: self.sns,
        };
        (account, server)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (STARLING__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("http.user_agent", concat!("Starling/", env!("CARGO_PKG_VERSION")))?
            .set_default("http.timeout_seconds", 30)?
            .set_default("timeline.page_size", 20)?
            .set_default("streaming.enabled", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("STARLING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const MAX_PAGE_SIZE: usize = 40;

        if self.http.timeout_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "http.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.timeline.page_size == 0 || self.timeline.page_size > MAX_PAGE_SIZE {
            return Err(crate::error::AppError::Config(format!(
                "timeline.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.access_token.trim().is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "accounts: access_token for @{}@{} must not be empty",
                    account.username, account.domain
                )));
            }

            let base_url = account.base_url();
            let parsed = url::Url::parse(&base_url).map_err(|e| {
                crate::error::AppError::Config(format!(
                    "accounts: invalid base_url {}: {}",
                    base_url, e
                ))
            })?;
            if parsed.host_str().is_none() {
                return Err(crate::error::AppError::Config(format!(
                    "accounts: base_url {} has no host",
                    base_url
                )));
            }

            if !seen.insert((account.username.as_str(), account.domain.as_str())) {
                return Err(crate::error::AppError::Config(format!(
                    "accounts: @{}@{} is configured more than once",
                    account.username, account.domain
                )));
            }
        }

        if self.accounts.is_empty() {
            tracing::warn!("No accounts configured; composer and timelines will stay empty");
        }

        Ok(())
    }
}
