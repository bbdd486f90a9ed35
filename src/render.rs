//! Render projections
//!
//! Pure conversions from reconciled state into display rows. Remote HTML is
//! sanitized, plain text is escaped, and custom emoji are substituted last.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{Account, Emoji, Notification, Status};
use crate::service::{Classified, ComposeSession, EmojiCatalog, ThreadView, classify, emojify};

// =============================================================================
// Messages
// =============================================================================

/// Localized message lookup
pub trait Messages: Send + Sync {
    /// Message for `key` with `{user}` replaced by `user`.
    ///
    /// `user` is inserted as given; callers escape it first.
    fn format(&self, key: &str, user: &str) -> String;
}

/// Built-in English table
#[derive(Debug, Clone)]
pub struct EnglishMessages {
    table: HashMap<&'static str, &'static str>,
}

impl Default for EnglishMessages {
    fn default() -> Self {
        let table = HashMap::from([
            ("timeline.notification.follow.body", "{user} followed you"),
            (
                "timeline.notification.follow_request.body",
                "{user} requested to follow you",
            ),
            (
                "timeline.notification.favourite.body",
                "{user} favourited your post",
            ),
            ("timeline.notification.reblog.body", "{user} boosted your post"),
            ("timeline.notification.poll_expired.body", "A poll has ended"),
            (
                "timeline.notification.poll_vote.body",
                "{user} voted in your poll",
            ),
            ("timeline.notification.quote.body", "{user} quoted your post"),
            ("timeline.notification.status.body", "{user} just posted"),
            (
                "timeline.notification.emoji_reaction.body",
                "{user} reacted to your post",
            ),
            ("timeline.notification.move.body", "{user} moved to"),
            ("timeline.status.reblogged", "{user} boosted"),
        ]);
        Self { table }
    }
}

impl Messages for EnglishMessages {
    fn format(&self, key: &str, user: &str) -> String {
        match self.table.get(key) {
            Some(template) => template.replace("{user}", user),
            None => {
                tracing::debug!(key, "Missing message");
                key.to_string()
            }
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// Account as shown next to a status or notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountLine {
    /// Escaped display name with custom emoji substituted
    pub display_name_html: String,
    pub acct: String,
    pub avatar: String,
}

/// One timeline or thread entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCard {
    /// Id of the entry, the wrapper id for reblogs
    pub id: String,
    /// Id of the displayed status
    pub original_id: String,
    pub author: AccountLine,
    /// Set when the entry is a reblog wrapper
    pub reblogged_by: Option<AccountLine>,
    pub content_html: String,
    pub spoiler_text: String,
    pub sensitive: bool,
    pub created_at: DateTime<Utc>,
    pub edited: bool,
    pub replies_count: u32,
    pub reblogs_count: u32,
    pub favourites_count: u32,
    pub favourited: bool,
    pub reblogged: bool,
    pub bookmarked: bool,
    pub media_count: usize,
}

/// One notification entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum NotificationRow {
    ActorOnly {
        id: String,
        action_html: String,
        actor: AccountLine,
    },
    Reaction {
        id: String,
        action_html: String,
        actor: AccountLine,
        status: Option<StatusCard>,
    },
    Mention {
        id: String,
        status: StatusCard,
    },
    Move {
        id: String,
        action_html: String,
        actor: AccountLine,
        target: AccountLine,
    },
}

/// Composer header and picker state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposerView {
    pub handle: Option<String>,
    pub text: String,
    pub submitting: bool,
    pub picker: Vec<PickerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerEntry {
    pub shortcode: String,
    pub src: String,
    pub keywords: Vec<String>,
}

// =============================================================================
// Projections
// =============================================================================

pub fn account_line(account: &Account) -> AccountLine {
    AccountLine {
        display_name_html: display_name_html(account),
        acct: account.acct.clone(),
        avatar: account.avatar.clone(),
    }
}

fn display_name_html(account: &Account) -> String {
    let escaped = html_escape::encode_text(account.display_name_or_username());
    emojify(&escaped, &account.emojis)
}

/// Project a status; wrappers show their original with the booster on top
pub fn status_card(status: &Status) -> StatusCard {
    let original = status.original();
    let reblogged_by = status.is_wrapper().then(|| account_line(&status.account));

    StatusCard {
        id: status.id.clone(),
        original_id: original.id.clone(),
        author: account_line(&original.account),
        reblogged_by,
        content_html: content_html(&original.content, &original.emojis),
        spoiler_text: emojify(
            &html_escape::encode_text(&original.spoiler_text),
            &original.emojis,
        ),
        sensitive: original.sensitive,
        created_at: original.created_at,
        edited: original.edited_at.is_some(),
        replies_count: original.replies_count,
        reblogs_count: original.reblogs_count,
        favourites_count: original.favourites_count,
        favourited: original.favourited.unwrap_or(false),
        reblogged: original.reblogged.unwrap_or(false),
        bookmarked: original.bookmarked.unwrap_or(false),
        media_count: original.media_attachments.len(),
    }
}

fn content_html(content: &str, emojis: &[Emoji]) -> String {
    emojify(&ammonia::clean(content), emojis)
}

/// Project a notification; suppressed ones yield `None`
pub fn notification_row(
    notification: &Notification,
    messages: &dyn Messages,
) -> Option<NotificationRow> {
    let id = notification.id.clone();
    let action_html = |actor: &Account, key: &str| {
        let user = html_escape::encode_text(actor.display_name_or_username());
        emojify(&messages.format(key, &user), &actor.emojis)
    };

    let row = match classify(notification) {
        Classified::ActorOnly { actor, action_key } => NotificationRow::ActorOnly {
            id,
            action_html: action_html(actor, action_key),
            actor: account_line(actor),
        },
        Classified::Reaction {
            actor,
            status,
            action_key,
        } => NotificationRow::Reaction {
            id,
            action_html: action_html(actor, action_key),
            actor: account_line(actor),
            status: status.map(|status| status_card(status)),
        },
        Classified::Mention { status } => NotificationRow::Mention {
            id,
            status: status_card(status),
        },
        Classified::Move {
            actor,
            target,
            action_key,
        } => NotificationRow::Move {
            id,
            action_html: action_html(actor, action_key),
            actor: account_line(actor),
            target: account_line(target),
        },
        Classified::Suppressed => return None,
    };
    Some(row)
}

pub fn notification_rows(
    notifications: &[Notification],
    messages: &dyn Messages,
) -> Vec<NotificationRow> {
    notifications
        .iter()
        .filter_map(|notification| notification_row(notification, messages))
        .collect()
}

/// Thread rows in display order
pub fn thread_cards(view: &ThreadView) -> Vec<StatusCard> {
    view.sequence().iter().map(|status| status_card(status)).collect()
}

pub fn picker_entries(catalog: &EmojiCatalog) -> Vec<PickerEntry> {
    catalog
        .emojis
        .iter()
        .filter_map(|emoji| {
            let skin = emoji.skins.first()?;
            Some(PickerEntry {
                shortcode: emoji.id.clone(),
                src: skin.src.clone(),
                keywords: emoji.keywords.clone(),
            })
        })
        .collect()
}

pub fn composer_view(session: &ComposeSession) -> ComposerView {
    ComposerView {
        handle: session.selected_handle(),
        text: session.text(),
        submitting: session.phase() == crate::service::Phase::Submitting,
        picker: session
            .catalog()
            .map(|catalog| picker_entries(&catalog))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::{NotificationKind, Server, Sns};

    fn blobcat() -> Emoji {
        Emoji {
            shortcode: "blobcat".to_string(),
            url: "https://cdn.example/blobcat.png".to_string(),
            ..Default::default()
        }
    }

    fn account(display_name: &str) -> Account {
        Account {
            username: "alice".to_string(),
            acct: "alice@one.example".to_string(),
            display_name: display_name.to_string(),
            emojis: vec![blobcat()],
            ..Default::default()
        }
    }

    fn notification(kind: NotificationKind) -> Notification {
        Notification {
            id: "n1".to_string(),
            kind,
            created_at: Default::default(),
            account: account("<b>Alice</b> :blobcat:"),
            status: None,
            target: None,
        }
    }

    #[test]
    fn move_text_escapes_then_substitutes() {
        let mut moved = notification(NotificationKind::Move);
        moved.target = Some(account("New"));

        let row = notification_row(&moved, &EnglishMessages::default()).unwrap();
        let NotificationRow::Move { action_html, .. } = row else {
            panic!("expected move row");
        };
        assert!(action_html.starts_with("&lt;b&gt;Alice&lt;/b&gt; <img class=\"emojione\""));
        assert!(action_html.ends_with(" moved to"));
        assert!(!action_html.contains("<b>"));
    }

    #[test]
    fn suppressed_notifications_have_no_row() {
        let messages = EnglishMessages::default();
        assert!(notification_row(&notification(NotificationKind::Mention), &messages).is_none());
        assert!(notification_row(&notification(NotificationKind::Move), &messages).is_none());
        assert!(notification_row(&notification(NotificationKind::Unknown), &messages).is_none());

        let rows = notification_rows(&[notification(NotificationKind::Follow)], &messages);
        assert!(matches!(&rows[0], NotificationRow::ActorOnly { action_html, .. } if action_html.ends_with("followed you")));
    }

    #[test]
    fn status_card_sanitizes_content() {
        let status = Status {
            id: "1".to_string(),
            content: "<p>hi :blobcat:</p><script>alert(1)</script>".to_string(),
            emojis: vec![blobcat()],
            ..Default::default()
        };

        let card = status_card(&status);
        assert!(!card.content_html.contains("script"));
        assert!(card.content_html.contains("src=\"https://cdn.example/blobcat.png\""));
        assert!(card.reblogged_by.is_none());
    }

    #[test]
    fn wrapper_card_shows_original() {
        let original = Arc::new(Status {
            id: "O".to_string(),
            content: "<p>original</p>".to_string(),
            favourites_count: 4,
            account: account("Bob"),
            ..Default::default()
        });
        let wrapper = Status {
            id: "W".to_string(),
            account: account("Carol"),
            reblog: Some(original),
            ..Default::default()
        };

        let card = status_card(&wrapper);
        assert_eq!(card.id, "W");
        assert_eq!(card.original_id, "O");
        assert_eq!(card.favourites_count, 4);
        assert_eq!(card.author.display_name_html, "Bob");
        assert_eq!(card.reblogged_by.unwrap().display_name_html, "Carol");
    }

    #[test]
    fn picker_lists_catalog_in_order() {
        let server = Server {
            domain: "one.example".to_string(),
            base_url: "https://one.example".to_string(),
            sns: Sns::Mastodon,
        };
        let catalog = EmojiCatalog::build(&server, &[blobcat()]);

        let entries = picker_entries(&catalog);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].shortcode, "blobcat");
        assert_eq!(entries[0].src, "https://cdn.example/blobcat.png");
    }

    #[test]
    fn unknown_message_key_falls_back_to_key() {
        assert_eq!(EnglishMessages::default().format("nope", "x"), "nope");
    }
}
