//! Testing helpers and mock utilities.
//!
//! Provides ready-made mocked storage backends and chat transports.

use crate::session::ChatKey;
use crate::storage::{MockStorageBackend, StorageKind};
use crate::transport::{Keyboard, MockChatTransport};
use std::sync::{Arc, Mutex};

/// Bytes every mocked attachment download returns
pub const ATTACHMENT_BYTES: &[u8] = b"attachment";

/// One outbound message captured by [`recording_transport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    /// Text reply
    Text {
        /// Recipient
        chat: ChatKey,
        /// HTML text
        text: String,
        /// Reply keyboard, if one was attached
        keyboard: Option<Keyboard>,
    },
    /// Document reply
    Document {
        /// Recipient
        chat: ChatKey,
        /// Attachment name
        file_name: String,
        /// Attachment content
        bytes: Vec<u8>,
    },
}

/// Create a mock transport that records everything it sends.
///
/// Attachment downloads always succeed with [`ATTACHMENT_BYTES`].
#[must_use]
pub fn recording_transport() -> (MockChatTransport, Arc<Mutex<Vec<Sent>>>) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let mut mock = MockChatTransport::new();

    let log = Arc::clone(&sent);
    mock.expect_send_text().returning(move |chat, text, keyboard| {
        if let Ok(mut log) = log.lock() {
            log.push(Sent::Text {
                chat,
                text: text.to_string(),
                keyboard,
            });
        }
        Ok(())
    });

    let log = Arc::clone(&sent);
    mock.expect_send_document()
        .returning(move |chat, file_name, bytes| {
            if let Ok(mut log) = log.lock() {
                log.push(Sent::Document {
                    chat,
                    file_name: file_name.to_string(),
                    bytes,
                });
            }
            Ok(())
        });

    mock.expect_download_attachment()
        .returning(|_| Ok(ATTACHMENT_BYTES.to_vec()));

    (mock, sent)
}

/// Create a mock backend of the given kind where every operation succeeds
/// with an empty result.
#[must_use]
pub fn mock_backend_noop(kind: StorageKind) -> MockStorageBackend {
    let mut mock = MockStorageBackend::new();
    mock.expect_kind().return_const(kind);
    mock.expect_ensure_folder().returning(|_| Ok(()));
    mock.expect_upload().returning(|_, _| Ok(()));
    mock.expect_list_top_level_folders()
        .returning(|| Ok(Vec::new()));
    mock.expect_recursive_search()
        .returning(|_, _| Ok(Vec::new()));
    mock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageBackend;
    use crate::transport::ChatTransport;

    #[tokio::test]
    async fn test_recording_transport_keeps_order() -> anyhow::Result<()> {
        let (transport, sent) = recording_transport();

        transport.send_text(1, "first", None).await?;
        transport.send_document(1, "a.txt", b"x".to_vec()).await?;

        let recorded = sent.lock().map(|s| s.len()).unwrap_or_default();
        assert_eq!(recorded, 2);
        assert_eq!(transport.download_attachment("id").await?, ATTACHMENT_BYTES);
        Ok(())
    }

    #[tokio::test]
    async fn test_noop_backend() -> anyhow::Result<()> {
        let backend = mock_backend_noop(StorageKind::Ftp);
        assert_eq!(backend.kind(), StorageKind::Ftp);
        assert!(backend.recursive_search("", "x").await?.is_empty());
        Ok(())
    }
}
