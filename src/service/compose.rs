//! Compose session
//!
//! Owns the active account selection, the client and emoji catalog derived
//! from it, and the draft being written. Submission is single-flight: a
//! submit while another is pending does nothing.

use std::sync::{Arc, Mutex};

use super::emoji::EmojiCatalog;
use super::generation::{Completion, Generation};
use super::lock;
use crate::api::{AccountDirectory, ClientFactory, SessionClient};
use crate::data::{Account, Server, Status};
use crate::error::{AppError, Result};
use crate::metrics::{ACCOUNT_SWITCHES_TOTAL, SUBMISSIONS_TOTAL};

/// Submission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
}

/// Result of a submit request that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Posted(Arc<Status>),
    /// Another submission was still pending; nothing was sent
    AlreadySubmitting,
}

/// Symbol chosen in the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickedSymbol {
    /// Unicode emoji
    Native(String),
    /// Custom emoji, inserted as `:shortcode:`
    Custom { shortcode: String },
}

struct Selection {
    index: usize,
    account: Account,
    server: Server,
    client: Arc<dyn SessionClient>,
    catalog: Option<EmojiCatalog>,
}

#[derive(Debug)]
struct Draft {
    text: String,
    phase: Phase,
}

/// Composer session state
pub struct ComposeSession {
    factory: Arc<dyn ClientFactory>,
    accounts: Vec<(Account, Server)>,
    selection: Mutex<Option<Selection>>,
    generation: Generation,
    draft: Mutex<Draft>,
}

impl ComposeSession {
    /// Create a session over `accounts` without selecting any
    pub fn new(factory: Arc<dyn ClientFactory>, accounts: Vec<(Account, Server)>) -> Self {
        Self {
            factory,
            accounts,
            selection: Mutex::new(None),
            generation: Generation::new(),
            draft: Mutex::new(Draft {
                text: String::new(),
                phase: Phase::Idle,
            }),
        }
    }

    /// List session accounts and select the first one
    ///
    /// When no client can be built for the first account the session is
    /// still returned, with nothing selected.
    ///
    /// # Errors
    /// Returns error if listing fails
    pub async fn load(
        directory: &dyn AccountDirectory,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<Self> {
        let accounts = directory.list_accounts().await?;
        tracing::info!(accounts = accounts.len(), "Compose session loaded");

        let session = Self::new(factory, accounts);
        if !session.accounts.is_empty() {
            if let Err(error) = session.select_account(0) {
                tracing::warn!(%error, "First account unusable; no account selected");
            }
        }
        Ok(session)
    }

    pub fn accounts(&self) -> &[(Account, Server)] {
        &self.accounts
    }

    /// Make `index` the active account.
    ///
    /// Rebuilds the client and clears the catalog; catalog fetches started
    /// for the previous selection are discarded when they complete.
    pub fn select_account(&self, index: usize) -> Result<()> {
        let (account, server) = self.accounts.get(index).ok_or_else(|| {
            AppError::Validation(format!("no account at position {}", index))
        })?;

        self.generation.advance();
        let client = match self.factory.build(account, server) {
            Ok(client) => client,
            Err(error) => {
                error.record("compose.select_account");
                *lock(&self.selection) = None;
                return Err(error);
            }
        };

        *lock(&self.selection) = Some(Selection {
            index,
            account: account.clone(),
            server: server.clone(),
            client,
            catalog: None,
        });
        ACCOUNT_SWITCHES_TOTAL.inc();
        tracing::info!(account = %account.key(&server.domain), "Active account selected");
        Ok(())
    }

    pub fn selected_index(&self) -> Option<usize> {
        lock(&self.selection).as_ref().map(|s| s.index)
    }

    pub fn selected(&self) -> Option<(Account, Server)> {
        lock(&self.selection)
            .as_ref()
            .map(|s| (s.account.clone(), s.server.clone()))
    }

    /// `@username@domain` of the active account
    pub fn selected_handle(&self) -> Option<String> {
        lock(&self.selection)
            .as_ref()
            .map(|s| format!("@{}@{}", s.account.username, s.server.domain))
    }

    pub fn client(&self) -> Option<Arc<dyn SessionClient>> {
        lock(&self.selection).as_ref().map(|s| s.client.clone())
    }

    /// Fetch and build the emoji catalog for the active account.
    ///
    /// Returns the number of catalog entries, or `Stale` when the selection
    /// changed while the fetch was in flight.
    pub async fn load_emojis(&self) -> Result<Completion<usize>> {
        let token = self.generation.token();
        let (client, server) = {
            let selection = lock(&self.selection);
            let selection = selection
                .as_ref()
                .ok_or_else(|| AppError::Validation("no account selected".to_string()))?;
            (selection.client.clone(), selection.server.clone())
        };

        let raw = match client.fetch_custom_emojis().await {
            Ok(raw) => raw,
            Err(error) => {
                // A failure for a selection that is gone is as stale as a success.
                if self.generation.complete(token, "compose.emojis", || ()).is_stale() {
                    return Ok(Completion::Stale);
                }
                let error = error.into_fetch("custom emojis");
                error.record("compose.emojis");
                return Err(error);
            }
        };

        Ok(self.generation.complete(token, "compose.emojis", || {
            let catalog = EmojiCatalog::build(&server, &raw);
            let count = catalog.len();
            tracing::debug!(
                domain = %server.domain,
                fetched = raw.len(),
                kept = count,
                "Emoji catalog built"
            );
            if let Some(selection) = lock(&self.selection).as_mut() {
                selection.catalog = Some(catalog);
            }
            count
        }))
    }

    pub fn catalog(&self) -> Option<EmojiCatalog> {
        lock(&self.selection)
            .as_ref()
            .and_then(|s| s.catalog.clone())
    }

    pub fn text(&self) -> String {
        lock(&self.draft).text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        lock(&self.draft).text = text.into();
    }

    pub fn phase(&self) -> Phase {
        lock(&self.draft).phase
    }

    /// Insert a picked symbol followed by a space at character `cursor`
    pub fn insert_symbol(&self, cursor: usize, symbol: &PickedSymbol) {
        let inserted = match symbol {
            PickedSymbol::Native(native) => format!("{} ", native),
            PickedSymbol::Custom { shortcode } => format!(":{}: ", shortcode),
        };

        let mut draft = lock(&self.draft);
        let at = draft
            .text
            .char_indices()
            .nth(cursor)
            .map_or(draft.text.len(), |(byte, _)| byte);
        draft.text.insert_str(at, &inserted);
    }

    /// Post the draft through the active account.
    ///
    /// # Errors
    /// - `Validation` for empty text or no active account; nothing is sent
    /// - `Submission` when the server rejects the post; the draft is kept
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let (client, text) = {
            let mut draft = lock(&self.draft);
            if draft.phase == Phase::Submitting {
                tracing::debug!("Submission already pending; ignoring");
                return Ok(SubmitOutcome::AlreadySubmitting);
            }
            if draft.text.trim().is_empty() {
                SUBMISSIONS_TOTAL.with_label_values(&["invalid"]).inc();
                return Err(AppError::Validation(
                    "status text must not be empty".to_string(),
                ));
            }
            let client = self
                .client()
                .ok_or_else(|| AppError::Validation("no account selected".to_string()))?;
            draft.phase = Phase::Submitting;
            (client, draft.text.clone())
        };

        let result = client.submit_status(&text).await;

        let mut draft = lock(&self.draft);
        draft.phase = Phase::Idle;
        match result {
            Ok(status) => {
                draft.text.clear();
                SUBMISSIONS_TOTAL.with_label_values(&["posted"]).inc();
                tracing::info!(status_id = %status.id, "Status posted");
                Ok(SubmitOutcome::Posted(Arc::new(status)))
            }
            Err(error) => {
                SUBMISSIONS_TOTAL.with_label_values(&["failed"]).inc();
                error.record("compose.submit");
                tracing::warn!(%error, "Status submission failed");
                Err(AppError::Submission(error.to_string()))
            }
        }
    }
}
