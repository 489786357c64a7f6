#![deny(missing_docs)]
//! File relay core library.
//!
//! Session state, storage backends (Yandex Disk and FTP) and the
//! conversation state machine shared by chat transports.

/// Configuration management.
pub mod config;
/// Conversation state machine and presentation.
pub mod conversation;
/// Per-chat session store.
pub mod session;
/// Remote storage backends.
pub mod storage;
/// Chat transport abstraction.
pub mod transport;
/// Utility functions.
pub mod utils;

/// Mock constructors for unit tests.
#[cfg(test)]
pub mod testing;
