//! Open views
//!
//! Every display surface holds its own copies of statuses. `ViewSet` is the
//! broadcast point: an update from any source is merged into each view, so
//! all visible copies change together.

use std::sync::{Arc, Mutex};

use super::generation::{Completion, Generation};
use super::notification::classify;
use super::thread::ThreadPane;
use super::{Load, lock, merge};
use crate::api::{SessionClient, StreamEvent};
use crate::data::{Notification, Status};
use crate::metrics::{
    MERGES_TOTAL, NOTIFICATIONS_CLASSIFIED_TOTAL, REMOVALS_TOTAL, STREAM_EVENTS_TOTAL,
};

// =============================================================================
// Timeline
// =============================================================================

/// Flat, newest-first status list
#[derive(Debug)]
pub struct TimelineView {
    statuses: Mutex<Vec<Arc<Status>>>,
    load: Mutex<Load>,
}

impl Default for TimelineView {
    fn default() -> Self {
        Self {
            statuses: Mutex::new(Vec::new()),
            load: Mutex::new(Load::Loading),
        }
    }
}

impl TimelineView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<Arc<Status>> {
        lock(&self.statuses).clone()
    }

    pub fn load_state(&self) -> Load {
        lock(&self.load).clone()
    }

    fn set_loaded(&self, result: crate::error::Result<Vec<Status>>) {
        match result {
            Ok(statuses) => {
                *lock(&self.statuses) = statuses.into_iter().map(Arc::new).collect();
                *lock(&self.load) = Load::Ready;
            }
            Err(error) => {
                let error = error.into_fetch("home timeline");
                error.record("views.home");
                tracing::warn!(%error, "Failed to load home timeline");
                *lock(&self.load) = Load::Failed(error.to_string());
            }
        }
    }

    /// Show a status that arrived as new.
    ///
    /// A status already present by id is merged instead, so replays of the
    /// same event never create duplicates. Otherwise the displayed original
    /// is merged into the existing entries before prepending, so older
    /// copies of it stay in step. Returns true when prepended.
    pub fn insert_new(&self, status: Arc<Status>) -> bool {
        let mut statuses = lock(&self.statuses);
        if statuses.iter().any(|element| element.id == status.id) {
            merge::apply(&mut statuses, &status);
            return false;
        }
        merge::apply(&mut statuses, &displayed(&status));
        statuses.insert(0, status);
        true
    }

    pub fn apply_update(&self, updated: &Arc<Status>) -> usize {
        merge::apply(&mut lock(&self.statuses), updated)
    }

    pub fn apply_delete(&self, deleted_id: &str) -> usize {
        merge::apply_removal(&mut lock(&self.statuses), deleted_id)
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Newest-first notification list
#[derive(Debug)]
pub struct NotificationFeed {
    notifications: Mutex<Vec<Notification>>,
    load: Mutex<Load>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            load: Mutex::new(Load::Loading),
        }
    }
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    pub fn load_state(&self) -> Load {
        lock(&self.load).clone()
    }

    fn set_loaded(&self, result: crate::error::Result<Vec<Notification>>) {
        match result {
            Ok(notifications) => {
                for notification in &notifications {
                    count_category(notification);
                }
                *lock(&self.notifications) = notifications;
                *lock(&self.load) = Load::Ready;
            }
            Err(error) => {
                let error = error.into_fetch("notifications");
                error.record("views.notifications");
                tracing::warn!(%error, "Failed to load notifications");
                *lock(&self.load) = Load::Failed(error.to_string());
            }
        }
    }

    /// Prepend a notification unless one with the same id is shown
    pub fn insert(&self, notification: Notification) -> bool {
        let mut notifications = lock(&self.notifications);
        if notifications.iter().any(|n| n.id == notification.id) {
            return false;
        }
        count_category(&notification);
        notifications.insert(0, notification);
        true
    }

    /// Merge into the status embedded in each notification
    pub fn apply_update(&self, updated: &Arc<Status>) -> usize {
        let mut notifications = lock(&self.notifications);
        let mut touched = 0;
        for notification in notifications.iter_mut() {
            let replacement = notification
                .status
                .as_ref()
                .and_then(|status| merge::merge_one(status, updated));
            if let Some(replacement) = replacement {
                notification.status = Some(replacement);
                touched += 1;
            }
        }
        touched
    }

    /// Drop notifications about a deleted status
    pub fn apply_delete(&self, deleted_id: &str) -> usize {
        let mut notifications = lock(&self.notifications);
        let before = notifications.len();
        notifications.retain(|n| {
            !n.status
                .as_ref()
                .is_some_and(|status| merge::shows(status, deleted_id))
        });
        before - notifications.len()
    }
}

fn count_category(notification: &Notification) {
    NOTIFICATIONS_CLASSIFIED_TOTAL
        .with_label_values(&[classify(notification).category().as_str()])
        .inc();
}

// =============================================================================
// View set
// =============================================================================

/// All open views of the active session
#[derive(Debug, Default)]
pub struct ViewSet {
    pub home: TimelineView,
    pub notifications: NotificationFeed,
    pub thread: ThreadPane,
    generation: Generation,
}

impl ViewSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the newest page of the home timeline and notifications.
    ///
    /// The two sections load independently; a failure in one leaves the
    /// other intact. Returns `Stale` if `reset` ran while loading.
    pub async fn load(&self, client: &dyn SessionClient, page_size: usize) -> Completion<()> {
        let token = self.generation.token();
        let (home, notifications) = futures::join!(
            client.fetch_home_timeline(page_size),
            client.fetch_notifications(page_size)
        );

        self.generation.complete(token, "views.load", || {
            self.home.set_loaded(home);
            self.notifications.set_loaded(notifications);
            tracing::info!(
                home = self.home.statuses().len(),
                notifications = self.notifications.notifications().len(),
                "Views loaded"
            );
        })
    }

    /// Drop everything, e.g. after switching the active account
    pub fn reset(&self) {
        self.generation.advance();
        *lock(&self.home.statuses) = Vec::new();
        *lock(&self.home.load) = Load::Loading;
        *lock(&self.notifications.notifications) = Vec::new();
        *lock(&self.notifications.load) = Load::Loading;
        self.thread.close();
    }

    /// Merge an updated status into every view; returns copies replaced
    pub fn apply_status_update(&self, updated: Arc<Status>) -> usize {
        let updated = Status::flatten_shared(updated);
        let touched = [
            ("home", self.home.apply_update(&updated)),
            ("notifications", self.notifications.apply_update(&updated)),
            ("thread", self.thread.apply_update(&updated)),
        ];

        let mut total = 0;
        for (view, count) in touched {
            if count > 0 {
                MERGES_TOTAL.with_label_values(&[view]).inc_by(count as u64);
            }
            total += count;
        }
        tracing::debug!(status_id = %updated.id, replaced = total, "Status merged");
        total
    }

    /// Show a newly posted status on the home timeline and refresh any other
    /// copy of its original
    pub fn apply_new_status(&self, status: Arc<Status>) {
        let status = Status::flatten_shared(status);
        let original = displayed(&status);
        self.home.insert_new(status);
        self.notifications.apply_update(&original);
        self.thread.apply_update(&original);
    }

    /// Show a notification; its embedded status refreshes every other copy
    pub fn apply_notification(&self, mut notification: Notification) {
        let embedded = notification.status.take().map(Status::flatten_shared);
        if let Some(status) = &embedded {
            let original = displayed(status);
            let touched = self.home.apply_update(&original)
                + self.notifications.apply_update(&original)
                + self.thread.apply_update(&original);
            if touched > 0 {
                MERGES_TOTAL
                    .with_label_values(&["notification_embed"])
                    .inc_by(touched as u64);
            }
        }
        notification.status = embedded;
        if !self.notifications.insert(notification) {
            tracing::debug!("Duplicate notification ignored");
        }
    }

    /// Remove a deleted status from every view
    pub fn apply_delete(&self, deleted_id: &str) -> usize {
        let removed = [
            ("home", self.home.apply_delete(deleted_id)),
            ("notifications", self.notifications.apply_delete(deleted_id)),
            ("thread", self.thread.apply_delete(deleted_id)),
        ];

        let mut total = 0;
        for (view, count) in removed {
            if count > 0 {
                REMOVALS_TOTAL.with_label_values(&[view]).inc_by(count as u64);
            }
            total += count;
        }
        tracing::debug!(status_id = deleted_id, removed = total, "Status deleted");
        total
    }

    /// Route a streaming event
    pub fn apply_stream_event(&self, event: StreamEvent) {
        STREAM_EVENTS_TOTAL.with_label_values(&[event.name()]).inc();
        match event {
            StreamEvent::Update(status) => self.apply_new_status(status),
            StreamEvent::StatusUpdate(status) => {
                self.apply_status_update(status);
            }
            StreamEvent::Notification(notification) => self.apply_notification(*notification),
            StreamEvent::Delete(id) => {
                self.apply_delete(&id);
            }
            StreamEvent::Heartbeat => {}
        }
    }
}

/// The status whose content a timeline entry shows
fn displayed(status: &Arc<Status>) -> Arc<Status> {
    status.reblog.clone().unwrap_or_else(|| status.clone())
}
