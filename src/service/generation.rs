//! Generation tokens
//!
//! A view or selection owns a `Generation`; every async fetch captures a
//! `Token` before suspending and checks it on completion. Closing the view or
//! changing the selection advances the generation, which turns every
//! outstanding token stale.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic generation counter owned by one view or selection
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

/// Snapshot of a generation taken when an async operation starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token(u64);

/// Result of offering a completion to its originating context
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Completion<T> {
    Applied(T),
    /// The context was invalidated while the operation was in flight
    Stale,
}

impl<T> Completion<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Stale => None,
        }
    }
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for an operation starting now
    pub fn token(&self) -> Token {
        Token(self.current.load(Ordering::SeqCst))
    }

    /// Invalidate all outstanding tokens and return the new current token
    pub fn advance(&self) -> Token {
        Token(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: Token) -> bool {
        self.token() == token
    }

    /// Run `apply` only if `token` is still current.
    ///
    /// Stale completions are logged and counted under `context`.
    pub fn complete<T>(
        &self,
        token: Token,
        context: &'static str,
        apply: impl FnOnce() -> T,
    ) -> Completion<T> {
        if self.is_current(token) {
            Completion::Applied(apply())
        } else {
            tracing::debug!(context, "Discarding stale completion");
            crate::metrics::STALE_COMPLETIONS_TOTAL
                .with_label_values(&[context])
                .inc();
            Completion::Stale
        }
    }
}
