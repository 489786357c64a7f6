use super::resilient::{download_file_resilient, send_document_resilient, send_message_resilient};
use anyhow::Result;
use async_trait::async_trait;
use file_relay_core::session::ChatKey;
use file_relay_core::transport::{ChatTransport, Keyboard};
use file_relay_core::utils::{split_long_message, TELEGRAM_MESSAGE_LIMIT};
use teloxide::prelude::*;
use teloxide::types::{ChatId, KeyboardButton, KeyboardMarkup, ParseMode};
use tracing::debug;

/// Build a one-time, resized reply keyboard from button rows
#[must_use]
pub fn keyboard_markup(keyboard: &Keyboard) -> KeyboardMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    KeyboardMarkup::new(rows)
        .resize_keyboard()
        .one_time_keyboard()
}

/// Chat transport backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Wrap a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(
        &self,
        chat: ChatKey,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        let parts = split_long_message(text, TELEGRAM_MESSAGE_LIMIT);
        let last = parts.len().saturating_sub(1);
        let mut markup = keyboard.as_ref().map(keyboard_markup);

        for (i, part) in parts.into_iter().enumerate() {
            // The keyboard rides on the final part only
            let part_markup = if i == last { markup.take() } else { None };
            send_message_resilient(
                &self.bot,
                ChatId(chat),
                part,
                Some(ParseMode::Html),
                part_markup,
            )
            .await?;
        }
        Ok(())
    }

    async fn send_document(&self, chat: ChatKey, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        debug!("Sending '{file_name}' ({} bytes) to chat {chat}", bytes.len());
        send_document_resilient(&self.bot, ChatId(chat), file_name, &bytes).await?;
        Ok(())
    }

    async fn download_attachment(&self, file_id: &str) -> Result<Vec<u8>> {
        download_file_resilient(&self.bot, file_id).await
    }
}
