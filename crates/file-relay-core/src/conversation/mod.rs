//! Conversation state machine
//!
//! Turns inbound chat events into session updates, storage calls and replies.
//! Each chat has one pending [`Continuation`] that the next message answers;
//! documents are uploaded whatever step the chat is in.

/// Pending conversation steps
pub mod state;
/// Labels, keyboards and texts
pub mod views;

use crate::session::{ChatKey, Session, SessionStore};
use crate::storage::{join_remote_path, Backends, RemoteEntry, Retrieved, StorageKind};
use crate::transport::{ChatTransport, Keyboard};
use anyhow::Result;
use state::Continuation;
use std::sync::Arc;
use tracing::{error, info, warn};
use views::{
    catalog_keyboard, confirmation_keyboard, main_menu_keyboard, parse_storage_label,
    storage_keyboard, DefaultRelayView as View, MenuCommand, RelayView, LABEL_CANCEL,
    LABEL_ROOT_FOLDER, LABEL_YES,
};

/// File name used when a document arrives without one
pub const DEFAULT_FILE_NAME: &str = "document";

/// An inbound chat event, already stripped of transport details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Slash command
    Command(MenuCommand),
    /// Plain text or a keyboard button press
    Text(String),
    /// File attachment
    Document {
        /// Transport reference used to download the bytes
        file_id: String,
        /// Original file name, if the sender provided one
        file_name: Option<String>,
    },
    /// Any other content (stickers, photos, ...)
    Unsupported,
}

/// Per-chat command dispatcher
pub struct Conversation {
    sessions: Arc<SessionStore>,
    backends: Backends,
    transport: Arc<dyn ChatTransport>,
}

impl Conversation {
    /// Create a dispatcher over the given sessions, backends and transport
    #[must_use]
    pub fn new(
        sessions: Arc<SessionStore>,
        backends: Backends,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            sessions,
            backends,
            transport,
        }
    }

    /// Session store backing this conversation
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound event for `chat`.
    ///
    /// Storage failures are reported to the chat and never returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if a reply cannot be delivered.
    pub async fn handle(&self, chat: ChatKey, inbound: Inbound) -> Result<()> {
        let pending = self.sessions.take_pending(chat).await;
        match inbound {
            Inbound::Document { file_id, file_name } => {
                self.upload_document(chat, &file_id, file_name).await
            }
            Inbound::Command(command) => self.run_command(chat, command).await,
            Inbound::Text(text) => self.resume(chat, pending, Some(text.trim())).await,
            Inbound::Unsupported => self.resume(chat, pending, None).await,
        }
    }

    async fn resume(&self, chat: ChatKey, pending: Continuation, text: Option<&str>) -> Result<()> {
        match pending {
            Continuation::MainMenu => match text.map(str::parse::<MenuCommand>) {
                Some(Ok(command)) => self.run_command(chat, command).await,
                Some(Err(e)) => {
                    info!("Chat {chat}: {e}");
                    self.show_main_menu(chat, View::invalid_command()).await
                }
                None => self.show_main_menu(chat, View::invalid_command()).await,
            },
            Continuation::CatalogChoice => self.finish_catalog(chat, text).await,
            Continuation::StorageChoice => self.finish_settings(chat, text).await,
            Continuation::RootSearchConfirmation => self.confirm_root_search(chat, text).await,
            Continuation::SearchQuery => match text.filter(|q| !q.is_empty()) {
                Some(query) => self.search(chat, query).await,
                None => {
                    self.prompt(chat, View::invalid_choice(), None, Continuation::SearchQuery)
                        .await?;
                    self.prompt(chat, View::search_prompt(), None, Continuation::SearchQuery)
                        .await
                }
            },
        }
    }

    async fn run_command(&self, chat: ChatKey, command: MenuCommand) -> Result<()> {
        info!("Chat {chat} runs {command:?}.");
        match command {
            MenuCommand::Start => self.show_main_menu(chat, View::welcome()).await,
            MenuCommand::Faq => self.show_main_menu(chat, View::faq()).await,
            MenuCommand::Catalog => self.start_catalog(chat).await,
            MenuCommand::Settings => self.start_settings(chat).await,
            MenuCommand::Search => self.start_search(chat).await,
        }
    }

    // ─── replies ────────────────────────────────────────────────────────────

    async fn show_main_menu(&self, chat: ChatKey, text: &str) -> Result<()> {
        let keyboard = main_menu_keyboard(self.backends.ftp_enabled());
        self.prompt(chat, text, Some(keyboard), Continuation::MainMenu)
            .await
    }

    async fn prompt(
        &self,
        chat: ChatKey,
        text: &str,
        keyboard: Option<Keyboard>,
        next: Continuation,
    ) -> Result<()> {
        self.sessions.set_pending(chat, next).await;
        self.transport.send_text(chat, text, keyboard).await
    }

    // ─── upload ─────────────────────────────────────────────────────────────

    async fn upload_document(
        &self,
        chat: ChatKey,
        file_id: &str,
        file_name: Option<String>,
    ) -> Result<()> {
        let session = self.sessions.get(chat).await;
        let folder = session.folder_or_root();
        let file_name = file_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        let path = join_remote_path(folder, &file_name);

        info!(
            "Chat {chat} uploads '{path}' to {}.",
            session.storage
        );
        let text = match self.store_document(&session, file_id, &path).await {
            Ok(()) => View::upload_succeeded(&file_name, folder, session.storage),
            Err(e) => {
                error!("Failed to save file '{path}' for chat {chat}: {e:#}");
                View::upload_failed().to_string()
            }
        };
        self.show_main_menu(chat, &text).await
    }

    async fn store_document(&self, session: &Session, file_id: &str, path: &str) -> Result<()> {
        let backend = self.backends.get(session.storage)?;
        backend.ensure_folder(session.folder_or_root()).await?;
        let bytes = self.transport.download_attachment(file_id).await?;
        backend.upload(path, bytes).await?;
        info!("Stored '{path}' on {}.", backend.kind());
        Ok(())
    }

    // ─── catalog ────────────────────────────────────────────────────────────

    async fn start_catalog(&self, chat: ChatKey) -> Result<()> {
        let session = self.sessions.get(chat).await;
        let listing = match self.backends.get(session.storage) {
            Ok(backend) => backend.list_top_level_folders().await,
            Err(e) => Err(e),
        };
        match listing {
            Ok(folders) => {
                self.prompt(
                    chat,
                    View::choose_folder(),
                    Some(catalog_keyboard(&folders)),
                    Continuation::CatalogChoice,
                )
                .await
            }
            Err(e) => {
                error!("Failed to list folders for chat {chat}: {e}");
                self.show_main_menu(chat, View::listing_failed()).await
            }
        }
    }

    async fn finish_catalog(&self, chat: ChatKey, text: Option<&str>) -> Result<()> {
        let folder = match text {
            Some(LABEL_CANCEL) => return self.show_main_menu(chat, View::welcome()).await,
            Some(LABEL_ROOT_FOLDER) => "",
            Some(name) if !name.is_empty() => name,
            _ => {
                self.transport
                    .send_text(chat, View::invalid_choice(), None)
                    .await?;
                return self.start_catalog(chat).await;
            }
        };

        self.sessions.set_folder(chat, folder).await;
        info!("Chat {chat} selected folder '{folder}'.");
        self.transport
            .send_text(chat, &View::folder_selected(folder), None)
            .await?;
        self.show_main_menu(chat, View::send_file_prompt()).await
    }

    // ─── settings ───────────────────────────────────────────────────────────

    async fn start_settings(&self, chat: ChatKey) -> Result<()> {
        if !self.backends.ftp_enabled() {
            return self.show_main_menu(chat, View::ftp_unavailable()).await;
        }
        let current = self.sessions.get(chat).await.storage;
        self.prompt(
            chat,
            &View::choose_storage(current),
            Some(storage_keyboard()),
            Continuation::StorageChoice,
        )
        .await
    }

    async fn finish_settings(&self, chat: ChatKey, text: Option<&str>) -> Result<()> {
        if text == Some(LABEL_CANCEL) {
            return self.show_main_menu(chat, View::main_menu()).await;
        }
        let Some(Ok(kind)) = text.map(parse_storage_label) else {
            self.transport
                .send_text(chat, View::invalid_choice(), None)
                .await?;
            return self.start_settings(chat).await;
        };

        let current = self.sessions.get(chat).await.storage;
        let reply = if kind == current {
            View::storage_already_active(kind)
        } else if kind == StorageKind::Ftp && !self.backends.ftp_enabled() {
            View::ftp_unavailable().to_string()
        } else {
            self.sessions.set_storage(chat, kind).await;
            info!("Chat {chat} switched storage to {kind}.");
            View::storage_switched(kind)
        };
        self.show_main_menu(chat, &reply).await
    }

    // ─── search ─────────────────────────────────────────────────────────────

    async fn start_search(&self, chat: ChatKey) -> Result<()> {
        let session = self.sessions.get(chat).await;
        if session.folder.is_none() {
            return self
                .prompt(
                    chat,
                    View::confirm_root_search(),
                    Some(confirmation_keyboard()),
                    Continuation::RootSearchConfirmation,
                )
                .await;
        }
        self.prompt(chat, View::search_prompt(), None, Continuation::SearchQuery)
            .await
    }

    async fn confirm_root_search(&self, chat: ChatKey, text: Option<&str>) -> Result<()> {
        let accepted = text.is_some_and(|t| t.eq_ignore_ascii_case(LABEL_YES));
        if !accepted {
            info!("Chat {chat} declined root search.");
            return self.show_main_menu(chat, View::search_cancelled()).await;
        }
        self.sessions.set_folder(chat, "").await;
        self.prompt(chat, View::search_prompt(), None, Continuation::SearchQuery)
            .await
    }

    async fn search(&self, chat: ChatKey, query: &str) -> Result<()> {
        let session = self.sessions.get(chat).await;
        let folder = session.folder_or_root();
        info!(
            "Chat {chat} searches '{query}' in '{folder}' on {}.",
            session.storage
        );

        let backend = match self.backends.get(session.storage) {
            Ok(backend) => backend,
            Err(e) => {
                error!("Search unavailable for chat {chat}: {e}");
                return self.show_main_menu(chat, View::search_failed()).await;
            }
        };

        let found = match backend.recursive_search(folder, query).await {
            Ok(found) => found,
            Err(e) => {
                error!("Search for '{query}' failed for chat {chat}: {e}");
                return self.show_main_menu(chat, View::search_failed()).await;
            }
        };

        match found.as_slice() {
            [] => self.show_main_menu(chat, View::nothing_found()).await,
            [entry] => match backend.retrieve(entry).await {
                Ok(retrieved) => self.deliver(chat, entry, retrieved).await,
                Err(e) => {
                    error!("Failed to retrieve '{}' for chat {chat}: {e}", entry.path);
                    self.show_main_menu(chat, View::search_failed()).await
                }
            },
            entries => self.show_main_menu(chat, &View::found_many(entries)).await,
        }
    }

    async fn deliver(&self, chat: ChatKey, entry: &RemoteEntry, retrieved: Retrieved) -> Result<()> {
        match retrieved {
            Retrieved::Link(url) => self.show_main_menu(chat, &View::found_link(&url)).await,
            Retrieved::Content { file_name, bytes } => {
                self.show_main_menu(chat, &View::found_file(&entry.name))
                    .await?;
                if let Err(e) = self.transport.send_document(chat, &file_name, bytes).await {
                    warn!("Failed to relay '{}' to chat {chat}: {e:#}", entry.path);
                    self.transport
                        .send_text(chat, View::search_failed(), None)
                        .await?;
                }
                Ok(())
            }
        }
    }
}
