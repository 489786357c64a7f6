//! Text helpers and retry policy for chat API calls.

use anyhow::Result;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// Maximum length of a single Telegram message, in bytes
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Splits a long message on line boundaries into parts of at most `max_length` bytes.
///
/// A single line longer than `max_length` is cut on character boundaries.
///
/// # Examples
///
/// ```
/// use file_relay_core::utils::split_long_message;
/// let long_msg = "- report.pdf (disk:/Invoices/report.pdf)\n".repeat(200);
/// let parts = split_long_message(&long_msg, 4096);
/// assert!(parts.len() > 1);
/// ```
#[must_use]
pub fn split_long_message(message: &str, max_length: usize) -> Vec<String> {
    if message.is_empty() {
        return Vec::new();
    }
    if message.len() <= max_length {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();

    for line in message.lines() {
        if line.len() > max_length {
            if !current.is_empty() {
                parts.push(current.trim_end().to_string());
                current.clear();
            }
            let mut chunk = String::new();
            for c in line.chars() {
                if chunk.len() + c.len_utf8() > max_length {
                    parts.push(std::mem::take(&mut chunk));
                }
                chunk.push(c);
            }
            if !chunk.is_empty() {
                current.push_str(&chunk);
                current.push('\n');
            }
            continue;
        }

        if current.len() + line.len() + 1 > max_length && !current.is_empty() {
            parts.push(current.trim_end().to_string());
            current.clear();
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.is_empty() {
        parts.push(current.trim_end().to_string());
    }
    parts
}

/// Retry a Telegram API operation with exponential backoff and jitter.
///
/// Starts at 500ms, caps the delay at 4s and gives up after 3 retries
/// (see the constants in [`crate::config`]).
///
/// # Errors
///
/// Returns the last error once all attempts fail.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!("Telegram API operation failed after {TELEGRAM_API_MAX_RETRIES} retries: {e}");
        e
    })
}
