//! Starling - reconciliation core of a multi-account Mastodon client
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Render Layer                             │
//! │  - Status cards, notification rows, thread, composer        │
//! │  - HTML sanitizing and emoji substitution                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Status merging across views                              │
//! │  - Notification classification                              │
//! │  - Thread assembly, compose session, emoji catalog          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       API Layer                              │
//! │  - Mastodon REST client (reqwest)                           │
//! │  - User stream decoder                                      │
//! │  - Configured account directory                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: Server collaborators and their Mastodon implementations
//! - `service`: Reconciliation logic
//! - `render`: Display projections and messages
//! - `data`: Entity model
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus counters

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod render;
pub mod service;

use std::sync::Arc;

/// Application state shared by the binary and its tasks
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,

    /// Shared connection pool
    pub http_client: reqwest::Client,

    /// Composer and active account
    pub compose: Arc<service::ComposeSession>,

    /// Open views of the active account
    pub views: Arc<service::ViewSet>,

    pub messages: Arc<dyn render::Messages>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Build the HTTP client
    /// 2. List configured accounts
    /// 3. Select the first account
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built or the first account
    /// has no usable client
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let http_client = reqwest::Client::builder()
            .user_agent(config.http.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(config.http.timeout_seconds))
            .build()?;

        let directory = api::ConfigAccountDirectory::new(config.accounts.clone());
        let factory = Arc::new(api::MastodonClientFactory::new(http_client.clone()));
        let compose = service::ComposeSession::load(&directory, factory).await?;

        tracing::info!(
            accounts = compose.accounts().len(),
            "Application state initialized successfully"
        );

        Ok(Self {
            config: Arc::new(config),
            http_client,
            compose: Arc::new(compose),
            views: Arc::new(service::ViewSet::new()),
            messages: Arc::new(render::EnglishMessages::default()),
        })
    }

    /// Switch the active account and drop views of the previous one
    ///
    /// # Errors
    /// Returns error if `index` is out of range or no client can be built
    pub fn switch_account(&self, index: usize) -> Result<(), error::AppError> {
        self.compose.select_account(index)?;
        self.views.reset();
        Ok(())
    }
}
