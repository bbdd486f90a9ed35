//! Service layer
//!
//! Reconciliation logic between server responses and the open views.
//! Nothing here knows about HTTP; servers are reached through the
//! `SessionClient` seam in `crate::api`.

use std::sync::{Mutex, MutexGuard, PoisonError};

mod compose;
pub mod emoji;
pub mod generation;
pub mod merge;
pub mod notification;
mod thread;
mod timeline;

pub use compose::{ComposeSession, Phase, PickedSymbol, SubmitOutcome};
pub use emoji::{CatalogEmoji, EmojiCatalog, EmojiSkin, emojify};
pub use generation::{Completion, Generation, Token};
pub use notification::{Category, Classified, classify};
pub use thread::{ThreadPane, ThreadView};
pub use timeline::{NotificationFeed, TimelineView, ViewSet};

/// Load state of a view section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Load {
    Loading,
    Ready,
    Failed(String),
}

/// Lock a view mutex.
///
/// Critical sections only swap vectors and never panic midway, so a
/// poisoned lock still guards consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
