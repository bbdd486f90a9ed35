//! Mastodon REST client
//!
//! Speaks the Mastodon v1 API, which Pleroma, Friendica and GoToSocial also
//! answer. Every decoded status is flattened before it leaves this module.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::streaming::{self, StreamEvent};
use super::{ClientFactory, SessionClient};
use crate::data::{Account, Context, Emoji, Notification, Server, Status};
use crate::error::{AppError, Result};

/// Client bound to one account on one server
pub struct MastodonClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
}

#[derive(Debug, Serialize)]
struct PostStatusForm<'a> {
    status: &'a str,
}

impl MastodonClient {
    /// Create a client for `base_url` authenticated with `access_token`
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL cannot be parsed
    pub fn new(http: reqwest::Client, base_url: &str, access_token: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid base URL {}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            access_token: access_token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid endpoint {}: {}", path, e)))
    }

    fn status_path(id: &str, suffix: &str) -> String {
        format!("api/v1/statuses/{}{}", urlencoding::encode(id), suffix)
    }

    /// Send a request and map non-success responses to errors
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            401 => Err(AppError::Unauthorized),
            404 => Err(AppError::NotFound),
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Api { status: code, body })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let response = self.send(self.http.get(url).query(query)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Subscribe to the user stream (home updates, notifications, deletions)
    pub async fn stream_user(&self) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let url = self.endpoint("api/v1/streaming/user")?;
        tracing::info!(%url, "Opening user stream");
        let response = self.send(self.http.get(url)).await?;
        Ok(streaming::events(response.bytes_stream()).boxed())
    }
}

#[async_trait]
impl SessionClient for MastodonClient {
    async fn fetch_status(&self, id: &str) -> Result<Status> {
        let status: Status = self.get_json(&Self::status_path(id, ""), &[]).await?;
        Ok(status.flatten_reblog())
    }

    async fn fetch_context(&self, id: &str) -> Result<Context> {
        let context: Context = self
            .get_json(&Self::status_path(id, "/context"), &[])
            .await?;
        Ok(Context {
            ancestors: context.ancestors.into_iter().map(Status::flatten_shared).collect(),
            descendants: context.descendants.into_iter().map(Status::flatten_shared).collect(),
        })
    }

    async fn fetch_custom_emojis(&self) -> Result<Vec<Emoji>> {
        self.get_json("api/v1/custom_emojis", &[]).await
    }

    async fn submit_status(&self, text: &str) -> Result<Status> {
        let url = self.endpoint("api/v1/statuses")?;
        tracing::debug!(%url, "POST");
        let response = self
            .send(self.http.post(url).form(&PostStatusForm { status: text }))
            .await?;
        let bytes = response.bytes().await?;
        let status: Status = serde_json::from_slice(&bytes)?;
        Ok(status.flatten_reblog())
    }

    async fn fetch_home_timeline(&self, limit: usize) -> Result<Vec<Status>> {
        let statuses: Vec<Status> = self
            .get_json("api/v1/timelines/home", &[("limit", limit.to_string())])
            .await?;
        Ok(statuses.into_iter().map(Status::flatten_reblog).collect())
    }

    async fn fetch_notifications(&self, limit: usize) -> Result<Vec<Notification>> {
        let notifications: Vec<Notification> = self
            .get_json("api/v1/notifications", &[("limit", limit.to_string())])
            .await?;
        Ok(notifications
            .into_iter()
            .map(|mut notification| {
                notification.status = notification.status.map(Status::flatten_shared);
                notification
            })
            .collect())
    }
}

/// Builds `MastodonClient`s sharing one connection pool
pub struct MastodonClientFactory {
    http: reqwest::Client,
}

impl MastodonClientFactory {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ClientFactory for MastodonClientFactory {
    fn build(&self, account: &Account, server: &Server) -> Result<Arc<dyn SessionClient>> {
        if !server.sns.speaks_mastodon_api() {
            return Err(AppError::NotImplemented(format!(
                "{} servers are not supported",
                server.sns.as_str()
            )));
        }

        let token = account
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)?;

        tracing::debug!(
            account = %account.key(&server.domain),
            sns = server.sns.as_str(),
            "Building session client"
        );
        Ok(Arc::new(MastodonClient::new(
            self.http.clone(),
            &server.base_url,
            token,
        )?))
    }
}
