//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use starling::api::{ClientFactory, SessionClient};
use starling::config::{
    AccountConfig, AppConfig, HttpConfig, LoggingConfig, StreamingConfig, TimelineConfig,
};
use starling::data::{Account, Context, Emoji, Notification, Server, Sns, Status};
use starling::error::{AppError, Result};
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";

// =============================================================================
// Fixtures
// =============================================================================

pub fn status(id: &str, content: &str) -> Status {
    Status {
        id: id.to_string(),
        content: content.to_string(),
        ..Default::default()
    }
}

pub fn emoji(shortcode: &str) -> Emoji {
    Emoji {
        shortcode: shortcode.to_string(),
        url: format!("https://cdn.example/{}.png", shortcode),
        static_url: format!("https://cdn.example/{}.png", shortcode),
        visible_in_picker: true,
        ..Default::default()
    }
}

pub fn session_pair(username: &str, domain: &str) -> (Account, Server) {
    (
        Account {
            username: username.to_string(),
            acct: username.to_string(),
            access_token: Some(TOKEN.to_string()),
            ..Default::default()
        },
        Server {
            domain: domain.to_string(),
            base_url: format!("https://{}", domain),
            sns: Sns::Mastodon,
        },
    )
}

pub fn test_config(accounts: Vec<AccountConfig>) -> AppConfig {
    AppConfig {
        http: HttpConfig {
            user_agent: "Starling/test".to_string(),
            timeout_seconds: 5,
        },
        timeline: TimelineConfig { page_size: 20 },
        streaming: StreamingConfig { enabled: false },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
        accounts,
    }
}

// =============================================================================
// Fake session client
// =============================================================================

/// In-memory `SessionClient` that yields once inside every call, so
/// concurrent callers interleave deterministically under `tokio::join!`
#[derive(Default)]
pub struct FakeClient {
    pub emojis: Vec<Emoji>,
    pub statuses: HashMap<String, Status>,
    pub context: Context,
    pub home: Vec<Status>,
    pub reject_submissions: bool,
    pub fail_emojis: bool,
    pub status_fetches: AtomicUsize,
    pub emoji_fetches: AtomicUsize,
    pub submissions: AtomicUsize,
}

impl FakeClient {
    pub fn with_emojis(shortcodes: &[&str]) -> Self {
        Self {
            emojis: shortcodes.iter().map(|code| emoji(code)).collect(),
            ..Default::default()
        }
    }

    pub fn with_thread(focal: Status, ancestors: Vec<Status>, descendants: Vec<Status>) -> Self {
        Self {
            statuses: HashMap::from([(focal.id.clone(), focal)]),
            context: Context {
                ancestors: ancestors.into_iter().map(Arc::new).collect(),
                descendants: descendants.into_iter().map(Arc::new).collect(),
            },
            ..Default::default()
        }
    }
}

#[async_trait]
impl SessionClient for FakeClient {
    async fn fetch_status(&self, id: &str) -> Result<Status> {
        self.status_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.statuses.get(id).cloned().ok_or(AppError::NotFound)
    }

    async fn fetch_context(&self, _id: &str) -> Result<Context> {
        tokio::task::yield_now().await;
        Ok(self.context.clone())
    }

    async fn fetch_custom_emojis(&self) -> Result<Vec<Emoji>> {
        self.emoji_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail_emojis {
            return Err(AppError::Api {
                status: 500,
                body: "emoji index unavailable".to_string(),
            });
        }
        Ok(self.emojis.clone())
    }

    async fn submit_status(&self, text: &str) -> Result<Status> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.reject_submissions {
            return Err(AppError::Api {
                status: 422,
                body: r#"{"error":"Validation failed"}"#.to_string(),
            });
        }
        Ok(status("posted", text))
    }

    async fn fetch_home_timeline(&self, limit: usize) -> Result<Vec<Status>> {
        tokio::task::yield_now().await;
        Ok(self.home.iter().take(limit).cloned().collect())
    }

    async fn fetch_notifications(&self, _limit: usize) -> Result<Vec<Notification>> {
        tokio::task::yield_now().await;
        Ok(Vec::new())
    }
}

/// Hands out a prepared client per server domain
#[derive(Default)]
pub struct FakeFactory {
    pub clients: HashMap<String, Arc<FakeClient>>,
}

impl FakeFactory {
    pub fn with(mut self, domain: &str, client: FakeClient) -> Self {
        self.clients.insert(domain.to_string(), Arc::new(client));
        self
    }

    pub fn client(&self, domain: &str) -> Arc<FakeClient> {
        self.clients[domain].clone()
    }
}

impl ClientFactory for FakeFactory {
    fn build(&self, _account: &Account, server: &Server) -> Result<Arc<dyn SessionClient>> {
        let client = self.clients.get(&server.domain).ok_or(AppError::Unauthorized)?;
        Ok(client.clone())
    }
}

// =============================================================================
// Fake Mastodon server
// =============================================================================

/// Mastodon API stand-in bound to a random local port
pub struct TestServer {
    pub addr: String,
}

impl TestServer {
    pub async fn new() -> Self {
        let app = Router::new()
            .route("/api/v1/statuses", post(post_status))
            .route("/api/v1/statuses/:id", get(get_status))
            .route("/api/v1/statuses/:id/context", get(get_context))
            .route("/api/v1/custom_emojis", get(get_custom_emojis))
            .route("/api/v1/timelines/home", get(get_home))
            .route("/api/v1/notifications", get(get_notifications))
            .route("/api/v1/streaming/user", get(get_user_stream));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub fn account_json(username: &str) -> Value {
    json!({
        "id": format!("{}-id", username),
        "username": username,
        "acct": username,
        "display_name": username,
        "emojis": []
    })
}

pub fn status_json(id: &str, content: &str) -> Value {
    json!({
        "id": id,
        "uri": format!("https://remote.example/statuses/{}", id),
        "account": account_json("alice"),
        "content": content,
        "created_at": "2024-01-01T00:00:00.000Z",
        "emojis": [],
        "reblogged": false,
        "favourited": false,
        "bookmarked": false
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", TOKEN))
}

async fn get_status(headers: HeaderMap, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "token"})));
    }
    match id.as_str() {
        "missing" => (StatusCode::NOT_FOUND, Json(json!({"error": "Record not found"}))),
        "broken" => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "maintenance"})),
        ),
        // Reblog of a reblog; the client must collapse it
        "nested" => {
            let mut inner = status_json("inner", "");
            inner["reblog"] = status_json("original", "<p>original</p>");
            let mut outer = status_json("nested", "");
            outer["reblog"] = inner;
            (StatusCode::OK, Json(outer))
        }
        _ => (StatusCode::OK, Json(status_json(&id, "<p>focal</p>"))),
    }
}

async fn get_context(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "ancestors": [status_json("a1", "<p>a1</p>"), status_json("a2", "<p>a2</p>")],
        "descendants": [status_json(&format!("{}-reply", id), "<p>reply</p>")]
    }))
}

async fn get_custom_emojis() -> Json<Value> {
    Json(json!([
        {"shortcode": "blobcat", "url": "https://cdn.example/blobcat.png", "static_url": "https://cdn.example/blobcat.png", "visible_in_picker": true, "category": "blobs"},
        {"shortcode": "blobcat", "url": "https://cdn.example/other.png", "static_url": "https://cdn.example/other.png", "visible_in_picker": true},
        {"shortcode": "party", "url": "https://cdn.example/party.png", "static_url": "https://cdn.example/party.png", "visible_in_picker": true}
    ]))
}

async fn post_status(
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "token"})));
    }
    let text = form.get("status").cloned().unwrap_or_default();
    if text.len() > 500 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "Validation failed: Text character limit of 500 exceeded"})),
        );
    }
    (StatusCode::OK, Json(status_json("new", &text)))
}

async fn get_home() -> Json<Value> {
    let mut boost = status_json("w1", "");
    boost["reblog"] = status_json("s1", "<p>boosted</p>");
    Json(json!([boost, status_json("s1", "<p>boosted</p>")]))
}

async fn get_notifications() -> Json<Value> {
    Json(json!([
        {
            "id": "n1",
            "type": "favourite",
            "created_at": "2024-01-01T00:00:00.000Z",
            "account": account_json("bob"),
            "status": status_json("s1", "<p>boosted</p>")
        },
        {
            "id": "n2",
            "type": "pleroma:emoji_reaction",
            "created_at": "2024-01-01T00:00:00.000Z",
            "account": account_json("carol"),
            "status": status_json("s1", "<p>boosted</p>")
        },
        {
            "id": "n3",
            "type": "admin.sign_up",
            "created_at": "2024-01-01T00:00:00.000Z",
            "account": account_json("dave")
        }
    ]))
}

async fn get_user_stream() -> String {
    let update = status_json("s9", "<p>streamed</p>");
    format!(
        ":)\nevent: update\ndata: {}\n\nevent: delete\ndata: s1\n\n",
        update
    )
}
