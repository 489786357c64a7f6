//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Wrappers around Bot API calls that retry transient network failures using
//! exponential backoff with jitter.

use anyhow::{anyhow, Result};
use file_relay_core::utils::retry_telegram_operation;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, KeyboardMarkup, Message, ParseMode};

/// Send a message with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    parse_mode: Option<ParseMode>,
    markup: Option<KeyboardMarkup>,
) -> Result<Message> {
    let text = text.into();
    retry_telegram_operation(|| async {
        let mut req = bot.send_message(chat_id, text.clone());
        if let Some(pm) = parse_mode {
            req = req.parse_mode(pm);
        }
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await.map_err(|e| anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Send in-memory bytes as a document, retrying on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_document_resilient(
    bot: &Bot,
    chat_id: ChatId,
    file_name: &str,
    bytes: &[u8],
) -> Result<Message> {
    retry_telegram_operation(|| async {
        let input_file = InputFile::memory(bytes.to_vec()).file_name(file_name.to_string());
        bot.send_document(chat_id, input_file)
            .await
            .map_err(|e| anyhow!("Telegram send document error: {e}"))
    })
    .await
}

/// Download an attachment by file id (`get_file` + `download_file`), retrying
/// on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn download_file_resilient(bot: &Bot, file_id: &str) -> Result<Vec<u8>> {
    retry_telegram_operation(|| async {
        let file = bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| anyhow!("Telegram get_file error: {e}"))?;
        let mut buf = Vec::new();
        bot.download_file(&file.path, &mut buf)
            .await
            .map_err(|e| anyhow!("Telegram download error: {e}"))?;
        Ok(buf)
    })
    .await
}
