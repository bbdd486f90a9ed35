//! Notification classification
//!
//! Maps each notification kind to the rule used to interpret and render it.

use std::sync::Arc;

use crate::data::{Account, Notification, NotificationKind, Status};

/// Render category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    ActorOnly,
    Reaction,
    Mention,
    Move,
    Suppressed,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActorOnly => "actor_only",
            Self::Reaction => "reaction",
            Self::Mention => "mention",
            Self::Move => "move",
            Self::Suppressed => "suppressed",
        }
    }
}

/// A classified notification with the payload its category renders
#[derive(Debug, Clone, PartialEq)]
pub enum Classified<'a> {
    /// Follows and follow requests: only the actor is shown
    ActorOnly {
        actor: &'a Account,
        action_key: &'static str,
    },
    /// Interactions with a status; the status gives display context
    Reaction {
        actor: &'a Account,
        status: Option<&'a Arc<Status>>,
        action_key: &'static str,
    },
    /// Rendered exactly like a timeline entry
    Mention { status: &'a Arc<Status> },
    /// Account migration from `actor` to `target`
    Move {
        actor: &'a Account,
        target: &'a Account,
        action_key: &'static str,
    },
    /// Nothing is rendered
    Suppressed,
}

impl Classified<'_> {
    pub fn category(&self) -> Category {
        match self {
            Self::ActorOnly { .. } => Category::ActorOnly,
            Self::Reaction { .. } => Category::Reaction,
            Self::Mention { .. } => Category::Mention,
            Self::Move { .. } => Category::Move,
            Self::Suppressed => Category::Suppressed,
        }
    }
}

/// Message key of the action line for `kind`
pub fn action_key(kind: NotificationKind) -> Option<&'static str> {
    use NotificationKind as K;

    let key = match kind {
        K::Follow => "timeline.notification.follow.body",
        K::FollowRequest => "timeline.notification.follow_request.body",
        K::Favourite => "timeline.notification.favourite.body",
        K::Reblog => "timeline.notification.reblog.body",
        K::PollExpired => "timeline.notification.poll_expired.body",
        K::PollVote => "timeline.notification.poll_vote.body",
        K::Quote => "timeline.notification.quote.body",
        K::Status => "timeline.notification.status.body",
        K::EmojiReaction => "timeline.notification.emoji_reaction.body",
        K::Move => "timeline.notification.move.body",
        K::Mention | K::Unknown => return None,
    };
    Some(key)
}

/// Classify a notification.
///
/// A mention without a status or a move without a target has nothing to
/// show and is suppressed.
pub fn classify(notification: &Notification) -> Classified<'_> {
    use NotificationKind as K;

    let actor = &notification.account;
    let action_key = action_key(notification.kind).unwrap_or_default();
    match notification.kind {
        K::Follow | K::FollowRequest => Classified::ActorOnly { actor, action_key },
        K::Favourite
        | K::Reblog
        | K::PollExpired
        | K::PollVote
        | K::Quote
        | K::Status
        | K::EmojiReaction => Classified::Reaction {
            actor,
            status: notification.status.as_ref(),
            action_key,
        },
        K::Mention => match &notification.status {
            Some(status) => Classified::Mention { status },
            None => Classified::Suppressed,
        },
        K::Move => match &notification.target {
            Some(target) => Classified::Move {
                actor,
                target,
                action_key,
            },
            None => Classified::Suppressed,
        },
        K::Unknown => Classified::Suppressed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(kind: NotificationKind) -> Notification {
        Notification {
            id: "n1".to_string(),
            kind,
            created_at: Default::default(),
            account: Account {
                username: "alice".to_string(),
                ..Default::default()
            },
            status: Some(Arc::new(crate::data::Status {
                id: "s1".to_string(),
                ..Default::default()
            })),
            target: None,
        }
    }

    #[test]
    fn follow_request_is_actor_only() {
        let n = notification(NotificationKind::FollowRequest);
        assert_eq!(classify(&n).category(), Category::ActorOnly);
    }

    #[test]
    fn every_reaction_kind_is_reaction() {
        for kind in [
            NotificationKind::Favourite,
            NotificationKind::Reblog,
            NotificationKind::PollExpired,
            NotificationKind::PollVote,
            NotificationKind::Quote,
            NotificationKind::Status,
            NotificationKind::EmojiReaction,
        ] {
            let n = notification(kind);
            match classify(&n) {
                Classified::Reaction { actor, status, .. } => {
                    assert_eq!(actor.username, "alice");
                    assert_eq!(status.unwrap().id, "s1");
                }
                other => panic!("{kind:?} classified as {other:?}"),
            }
        }
    }

    #[test]
    fn mention_carries_status() {
        let n = notification(NotificationKind::Mention);
        assert!(matches!(classify(&n), Classified::Mention { status } if status.id == "s1"));

        let mut without_status = n.clone();
        without_status.status = None;
        assert_eq!(classify(&without_status), Classified::Suppressed);
    }

    #[test]
    fn move_needs_target() {
        let mut n = notification(NotificationKind::Move);
        n.status = None;
        assert_eq!(classify(&n), Classified::Suppressed);

        n.target = Some(Account {
            username: "alice_new".to_string(),
            ..Default::default()
        });
        match classify(&n) {
            Classified::Move {
                actor,
                target,
                action_key,
            } => {
                assert_eq!(actor.username, "alice");
                assert_eq!(target.username, "alice_new");
                assert_eq!(action_key, "timeline.notification.move.body");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_suppressed() {
        let n = notification(NotificationKind::Unknown);
        assert_eq!(classify(&n), Classified::Suppressed);
        assert_eq!(classify(&n).category(), Category::Suppressed);
    }
}
