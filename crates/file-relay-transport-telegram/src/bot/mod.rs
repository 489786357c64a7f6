/// Slash commands and message conversion
pub mod handlers;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// `ChatTransport` implementation over the Bot API
pub mod transport;
/// Unauthorized access flood protection
pub mod unauthorized_cache;

pub use transport::TelegramTransport;
pub use unauthorized_cache::UnauthorizedCache;
