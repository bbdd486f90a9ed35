//! Network collaborators
//!
//! The traits the core consumes for all I/O, and the bundled
//! implementations for Mastodon-compatible servers:
//! - `mastodon`: REST client and client factory
//! - `streaming`: user stream event decoder
//! - `directory`: configured session accounts

mod directory;
mod mastodon;
pub mod streaming;

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::{Account, Context, Emoji, Notification, Server, Status};
use crate::error::Result;

pub use directory::ConfigAccountDirectory;
pub use mastodon::{MastodonClient, MastodonClientFactory};
pub use streaming::{EventDecoder, StreamEvent};

/// Authenticated client for one session account on one server
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Fetch a single status by id
    async fn fetch_status(&self, id: &str) -> Result<Status>;

    /// Fetch ancestors and descendants of a status
    async fn fetch_context(&self, id: &str) -> Result<Context>;

    /// Fetch the server's custom emoji list
    async fn fetch_custom_emojis(&self) -> Result<Vec<Emoji>>;

    /// Post a new public status
    async fn submit_status(&self, text: &str) -> Result<Status>;

    /// Fetch the newest page of the home timeline
    async fn fetch_home_timeline(&self, limit: usize) -> Result<Vec<Status>>;

    /// Fetch the newest page of notifications
    async fn fetch_notifications(&self, limit: usize) -> Result<Vec<Notification>>;
}

/// Source of the session accounts the user can act as
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<(Account, Server)>>;
}

/// Builds the client for a selected account
#[cfg_attr(test, mockall::automock)]
pub trait ClientFactory: Send + Sync {
    fn build(&self, account: &Account, server: &Server) -> Result<Arc<dyn SessionClient>>;
}
