//! Per-chat session store
//!
//! Keeps the selected backend, the upload folder and the pending conversation
//! step for every chat. Entries live for the whole process.

use crate::conversation::state::Continuation;
use crate::storage::StorageKind;
use moka::future::Cache;
use moka::Entry;

/// Chat identifier
pub type ChatKey = i64;

/// Mutable state of one chat
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Backend uploads and searches go to
    pub storage: StorageKind,
    /// Upload folder: `None` if never chosen, `Some("")` for the root
    pub folder: Option<String>,
    /// Step the next inbound message answers
    pub pending: Continuation,
}

impl Session {
    /// Upload folder, with the root standing in for an unset folder
    #[must_use]
    pub fn folder_or_root(&self) -> &str {
        self.folder.as_deref().unwrap_or_default()
    }
}

/// Concurrent chat → session map with atomic per-chat updates
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<ChatKey, Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an empty store. Nothing is ever evicted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Cache::builder().build(),
        }
    }

    /// Current session, created with defaults on first access
    pub async fn get(&self, chat: ChatKey) -> Session {
        self.sessions.get_with(chat, async { Session::default() }).await
    }

    /// Apply `modify` to the chat's session atomically and return the result
    pub async fn update<F>(&self, chat: ChatKey, modify: F) -> Session
    where
        F: FnOnce(&mut Session) + Send,
    {
        let entry = self
            .sessions
            .entry(chat)
            .and_upsert_with(|current| {
                let mut session = current.map(Entry::into_value).unwrap_or_default();
                modify(&mut session);
                std::future::ready(session)
            })
            .await;
        entry.into_value()
    }

    /// Select the storage backend
    pub async fn set_storage(&self, chat: ChatKey, kind: StorageKind) -> Session {
        self.update(chat, |s| s.storage = kind).await
    }

    /// Select the upload folder; `""` is the root
    pub async fn set_folder(&self, chat: ChatKey, folder: impl Into<String>) -> Session {
        let folder = folder.into();
        self.update(chat, move |s| s.folder = Some(folder)).await
    }

    /// Register the step the next message answers
    pub async fn set_pending(&self, chat: ChatKey, pending: Continuation) {
        self.update(chat, |s| s.pending = pending).await;
    }

    /// Consume the pending step, leaving the main menu in its place
    pub async fn take_pending(&self, chat: ChatKey) -> Continuation {
        let mut taken = Continuation::MainMenu;
        self.update(chat, |s| taken = std::mem::take(&mut s.pending))
            .await;
        taken
    }

    /// Number of chats seen so far
    #[cfg(test)]
    pub async fn len(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }

    /// Whether no chat has interacted yet
    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
