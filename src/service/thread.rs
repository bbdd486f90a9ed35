//! Thread assembler
//!
//! A thread is shown as `ancestors → focal → descendants`. The focal status
//! is always fetched fresh on open; the context is fetched once and
//! afterwards only mutated by merges, never re-fetched or re-sorted.

use std::sync::{Arc, Mutex};

use super::generation::{Completion, Generation};
use super::{Load, lock, merge};
use crate::api::SessionClient;
use crate::data::Status;

/// Thread view state
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadView {
    focal_id: String,
    focal: Option<Arc<Status>>,
    focal_load: Load,
    ancestors: Vec<Arc<Status>>,
    descendants: Vec<Arc<Status>>,
    context_load: Load,
}

impl ThreadView {
    fn new(focal_id: &str, seed: Option<Arc<Status>>) -> Self {
        Self {
            focal_id: focal_id.to_string(),
            focal: seed,
            focal_load: Load::Loading,
            ancestors: Vec::new(),
            descendants: Vec::new(),
            context_load: Load::Loading,
        }
    }

    pub fn focal_id(&self) -> &str {
        &self.focal_id
    }

    /// Focal status; a seed copy until the fresh fetch lands
    pub fn focal(&self) -> Option<&Arc<Status>> {
        self.focal.as_ref()
    }

    pub fn ancestors(&self) -> &[Arc<Status>] {
        &self.ancestors
    }

    pub fn descendants(&self) -> &[Arc<Status>] {
        &self.descendants
    }

    pub fn focal_load(&self) -> &Load {
        &self.focal_load
    }

    /// Shared by ancestors and descendants, which arrive in one response
    pub fn context_load(&self) -> &Load {
        &self.context_load
    }

    /// Display order: ancestors, focal, descendants
    pub fn sequence(&self) -> Vec<Arc<Status>> {
        self.ancestors
            .iter()
            .chain(self.focal.iter())
            .chain(self.descendants.iter())
            .cloned()
            .collect()
    }

    /// Merge an update into each section independently
    pub fn apply_update(&mut self, updated: &Arc<Status>) -> usize {
        let mut touched = 0;
        if let Some(focal) = &self.focal {
            if let Some(replacement) = merge::merge_one(focal, updated) {
                self.focal = Some(replacement);
                touched += 1;
            }
        }
        touched += merge::apply(&mut self.ancestors, updated);
        touched += merge::apply(&mut self.descendants, updated);
        touched
    }

    /// Drop a deleted status (and wrappers of it) from every section
    pub fn apply_delete(&mut self, deleted_id: &str) -> usize {
        let mut removed = 0;
        if self
            .focal
            .as_ref()
            .is_some_and(|focal| merge::shows(focal, deleted_id))
        {
            self.focal = None;
            removed += 1;
        }
        removed += merge::apply_removal(&mut self.ancestors, deleted_id);
        removed += merge::apply_removal(&mut self.descendants, deleted_id);
        removed
    }
}

/// Owner of the open thread, if any
///
/// Opening, re-opening or closing advances the pane's generation, so fetches
/// still in flight for an earlier thread are discarded when they complete.
#[derive(Debug, Default)]
pub struct ThreadPane {
    generation: Generation,
    view: Mutex<Option<ThreadView>>,
}

impl ThreadPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the thread around `focal_id`
    pub async fn open(
        &self,
        client: &dyn SessionClient,
        focal_id: &str,
    ) -> Completion<ThreadView> {
        self.load(client, focal_id, None).await
    }

    /// Open a thread showing an already visible copy of the focal status
    /// until the authoritative fetch completes
    pub async fn open_seeded(
        &self,
        client: &dyn SessionClient,
        seed: Arc<Status>,
    ) -> Completion<ThreadView> {
        let focal_id = seed.id.clone();
        self.load(client, &focal_id, Some(seed)).await
    }

    async fn load(
        &self,
        client: &dyn SessionClient,
        focal_id: &str,
        seed: Option<Arc<Status>>,
    ) -> Completion<ThreadView> {
        let token = self.generation.advance();
        *lock(&self.view) = Some(ThreadView::new(focal_id, seed));
        tracing::debug!(focal_id, "Opening thread");

        let focal = client.fetch_status(focal_id).await;
        let applied = self.generation.complete(token, "thread.focal", || {
            self.update_view(|view| match focal {
                Ok(status) => {
                    view.focal = Some(Arc::new(status.flatten_reblog()));
                    view.focal_load = Load::Ready;
                }
                Err(error) => {
                    let error = error.into_fetch("focal");
                    error.record("thread.focal");
                    tracing::warn!(focal_id, %error, "Failed to refresh focal status");
                    view.focal_load = Load::Failed(error.to_string());
                }
            })
        });
        if applied.is_stale() {
            return Completion::Stale;
        }

        let context = client.fetch_context(focal_id).await;
        self.generation.complete(token, "thread.context", || {
            self.update_view(|view| match context {
                Ok(context) => {
                    tracing::debug!(
                        focal_id,
                        ancestors = context.ancestors.len(),
                        descendants = context.descendants.len(),
                        "Thread context loaded"
                    );
                    view.ancestors = context.ancestors;
                    view.descendants = context.descendants;
                    view.context_load = Load::Ready;
                }
                Err(error) => {
                    let error = error.into_fetch("context");
                    error.record("thread.context");
                    tracing::warn!(focal_id, %error, "Failed to fetch thread context");
                    view.context_load = Load::Failed(error.to_string());
                }
            });
            self.snapshot().unwrap_or_else(|| ThreadView::new(focal_id, None))
        })
    }

    fn update_view(&self, apply: impl FnOnce(&mut ThreadView)) {
        if let Some(view) = lock(&self.view).as_mut() {
            apply(view);
        }
    }

    /// Discard the thread; in-flight fetches for it are dropped on arrival
    pub fn close(&self) {
        self.generation.advance();
        if let Some(view) = lock(&self.view).take() {
            tracing::debug!(focal_id = view.focal_id(), "Thread closed");
        }
    }

    pub fn is_open(&self) -> bool {
        lock(&self.view).is_some()
    }

    /// Copy of the current thread state
    pub fn snapshot(&self) -> Option<ThreadView> {
        lock(&self.view).clone()
    }

    /// Ordered statuses of the open thread
    pub fn sequence(&self) -> Vec<Arc<Status>> {
        lock(&self.view)
            .as_ref()
            .map(ThreadView::sequence)
            .unwrap_or_default()
    }

    pub fn apply_update(&self, updated: &Arc<Status>) -> usize {
        lock(&self.view)
            .as_mut()
            .map_or(0, |view| view.apply_update(updated))
    }

    pub fn apply_delete(&self, deleted_id: &str) -> usize {
        lock(&self.view)
            .as_mut()
            .map_or(0, |view| view.apply_delete(deleted_id))
    }
}
