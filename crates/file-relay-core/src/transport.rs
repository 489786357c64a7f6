//! Chat transport abstraction
//!
//! What the conversation needs from a messenger: send text with an optional
//! reply keyboard, send a file, and download an inbound attachment.

use crate::session::ChatKey;
use anyhow::Result;
use async_trait::async_trait;

/// Reply keyboard: rows of button labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    /// Button rows, top to bottom
    pub rows: Vec<Vec<String>>,
}

impl Keyboard {
    /// Empty keyboard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of buttons
    #[must_use]
    pub fn row<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(labels.into_iter().map(Into::into).collect());
        self
    }

    /// All labels, row by row
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}

/// Outbound and attachment capabilities of a chat transport
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send an HTML-formatted message, optionally replacing the reply keyboard
    async fn send_text(&self, chat: ChatKey, text: &str, keyboard: Option<Keyboard>)
        -> Result<()>;

    /// Send a file as a document attachment
    async fn send_document(&self, chat: ChatKey, file_name: &str, bytes: Vec<u8>) -> Result<()>;

    /// Download the bytes of an inbound attachment
    async fn download_attachment(&self, file_id: &str) -> Result<Vec<u8>>;
}
