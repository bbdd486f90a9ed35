//! Entity models
//!
//! Wire-compatible shapes of the entities the client displays.
//! Statuses are shared between views as `Arc<Status>` and reconciled by id,
//! never mutated in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Status
// =============================================================================

/// A single post, either plain or a reblog wrapper around another status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub uri: String,
    pub url: Option<String>,
    pub account: Account,
    pub in_reply_to_id: Option<String>,
    pub in_reply_to_account_id: Option<String>,
    /// Reblogged original. Present only on wrapper statuses.
    pub reblog: Option<Arc<Status>>,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    #[serde(default)]
    pub replies_count: u32,
    #[serde(default)]
    pub reblogs_count: u32,
    #[serde(default)]
    pub favourites_count: u32,
    pub reblogged: Option<bool>,
    pub favourited: Option<bool>,
    pub bookmarked: Option<bool>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub spoiler_text: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
    pub language: Option<String>,
}

impl Status {
    /// True when this status only wraps a reblogged original
    pub fn is_wrapper(&self) -> bool {
        self.reblog.is_some()
    }

    /// The status whose content is actually displayed
    pub fn original(&self) -> &Status {
        self.reblog.as_deref().unwrap_or(self)
    }

    /// Collapse a reblog-of-a-reblog payload to its innermost original.
    ///
    /// Servers are not supposed to send nested wrappers, but nothing on the
    /// wire prevents it. Every ingestion point calls this so the merge rules
    /// only ever see one level of wrapping.
    pub fn flatten_reblog(mut self) -> Self {
        if let Some(mut original) = self.reblog.take() {
            while let Some(deeper) = original.reblog.clone() {
                original = deeper;
            }
            self.reblog = Some(original);
        }
        self
    }

    /// `flatten_reblog` for a shared status; already flat ones are returned as is
    pub fn flatten_shared(status: Arc<Status>) -> Arc<Status> {
        if status.reblog.as_ref().is_some_and(|r| r.is_wrapper()) {
            Arc::new(Arc::unwrap_or_clone(status).flatten_reblog())
        } else {
            status
        }
    }
}

/// Media attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    pub preview_url: Option<String>,
    pub remote_url: Option<String>,
    pub description: Option<String>,
    pub blurhash: Option<String>,
}

/// Ancestors and descendants of a focal status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub ancestors: Vec<Arc<Status>>,
    pub descendants: Vec<Arc<Status>>,
}

// =============================================================================
// Accounts and servers
// =============================================================================

/// Account, either a status author or a local session account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: String,
    pub username: String,
    /// `username` for accounts on the viewer's server, `username@domain` otherwise
    #[serde(default)]
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub avatar_static: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub bot: bool,
    /// Custom emoji referenced by `display_name` and `note`
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    /// Only set for local session accounts
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl Account {
    /// Globally unique `(username, domain)` identity.
    ///
    /// `home_domain` is the domain of the server the account was fetched from
    /// and is used when `acct` carries no domain part.
    pub fn key(&self, home_domain: &str) -> AccountKey {
        let domain = self
            .acct
            .split_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or(home_domain);
        AccountKey {
            username: self.username.clone(),
            domain: domain.to_string(),
        }
    }

    /// Name to display, falling back to the username
    pub fn display_name_or_username(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}

/// Account identity across servers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountKey {
    pub username: String,
    pub domain: String,
}

impl std::fmt::Display for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}@{}", self.username, self.domain)
    }
}

/// Protocol flavor spoken by a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sns {
    #[default]
    Mastodon,
    Pleroma,
    Friendica,
    Gotosocial,
    Firefish,
    Misskey,
}

impl Sns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mastodon => "mastodon",
            Self::Pleroma => "pleroma",
            Self::Friendica => "friendica",
            Self::Gotosocial => "gotosocial",
            Self::Firefish => "firefish",
            Self::Misskey => "misskey",
        }
    }

    /// Whether the server answers the Mastodon REST dialect
    pub fn speaks_mastodon_api(&self) -> bool {
        matches!(
            self,
            Self::Mastodon | Self::Pleroma | Self::Friendica | Self::Gotosocial
        )
    }
}

/// A server an account lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub domain: String,
    /// e.g. "https://social.example.com"
    pub base_url: String,
    #[serde(default)]
    pub sns: Sns,
}

// =============================================================================
// Custom emoji
// =============================================================================

/// Server-defined custom emoji
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    pub shortcode: String,
    pub url: String,
    #[serde(default)]
    pub static_url: String,
    #[serde(default = "default_visible_in_picker")]
    pub visible_in_picker: bool,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_visible_in_picker() -> bool {
    true
}

impl Default for Emoji {
    fn default() -> Self {
        Self {
            shortcode: String::new(),
            url: String::new(),
            static_url: String::new(),
            visible_in_picker: default_visible_in_picker(),
            category: None,
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Notification as delivered by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    /// Who triggered this notification
    pub account: Account,
    pub status: Option<Arc<Status>>,
    /// New account of a `move` notification
    #[serde(default)]
    pub target: Option<Account>,
}

/// Notification discriminant
///
/// Types this client does not know decode to `Unknown` and are never shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    FollowRequest,
    Favourite,
    Reblog,
    PollExpired,
    PollVote,
    Quote,
    Status,
    #[serde(alias = "pleroma:emoji_reaction", alias = "reaction")]
    EmojiReaction,
    Mention,
    Move,
    #[serde(other)]
    Unknown,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::FollowRequest => "follow_request",
            Self::Favourite => "favourite",
            Self::Reblog => "reblog",
            Self::PollExpired => "poll_expired",
            Self::PollVote => "poll_vote",
            Self::Quote => "quote",
            Self::Status => "status",
            Self::EmojiReaction => "emoji_reaction",
            Self::Mention => "mention",
            Self::Move => "move",
            Self::Unknown => "unknown",
        }
    }
}
