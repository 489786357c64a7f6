//! Remote storage backends
//!
//! Both backends implement [`StorageBackend`]; the conversation picks one at
//! runtime through [`Backends`] based on the chat's selection.

/// FTP backend.
pub mod ftp;
/// Depth-first file search shared by both backends.
pub mod search;
/// Yandex Disk REST backend.
pub mod yandex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use self::ftp::FtpBackend;
pub use self::yandex::YandexDisk;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Invalid or missing credentials, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),
    /// Upload, download or folder preparation failed
    #[error("Transfer error: {0}")]
    Transfer(String),
    /// Folder enumeration failed
    #[error("Listing error: {0}")]
    Listing(String),
    /// Tree traversal failed
    #[error("Search error: {0}")]
    Search(String),
    /// The selected backend is not configured
    #[error("Storage backend {0} is not configured")]
    Unavailable(StorageKind),
    /// HTTP transport error from the cloud API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// FTP protocol or connection error
    #[error("FTP error: {0}")]
    Ftp(#[from] ::ftp::FtpError),
    /// Blocking worker panicked or was cancelled
    #[error("Background task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Which backend a chat stores its files in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageKind {
    /// Yandex Disk
    #[default]
    CloudDisk,
    /// FTP server
    Ftp,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CloudDisk => f.write_str("Yandex Disk"),
            Self::Ftp => f.write_str("FTP"),
        }
    }
}

/// Kind of a remote entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Folder that can be listed
    Directory,
}

/// A file or directory returned by a listing or search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Entry name without the parent path
    pub name: String,
    /// Backend-specific address of the entry
    pub path: String,
    /// File or directory
    pub kind: EntryKind,
}

impl RemoteEntry {
    /// Create a file entry
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    /// Create a directory entry
    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::Directory,
        }
    }

    /// Returns true for directories
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// What a backend hands back for a found file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieved {
    /// Direct download URL, passed to the user verbatim
    Link(String),
    /// Full file content, relayed to the chat as a document
    Content {
        /// File name for the relayed document
        file_name: String,
        /// File bytes
        bytes: Vec<u8>,
    },
}

/// Interface for storage backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> StorageKind;

    /// Make sure `folder` exists, creating it if needed. Root (`""`) is a no-op.
    async fn ensure_folder(&self, folder: &str) -> Result<(), StorageError>;

    /// Store `bytes` at the root-relative `path`
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Directories directly under the root
    async fn list_top_level_folders(&self) -> Result<Vec<RemoteEntry>, StorageError>;

    /// Files below `root` whose name contains `query`, case-insensitively
    async fn recursive_search(
        &self,
        root: &str,
        query: &str,
    ) -> Result<Vec<RemoteEntry>, StorageError>;

    /// Fetch a link or the content for a file found by search
    async fn retrieve(&self, entry: &RemoteEntry) -> Result<Retrieved, StorageError>;
}

/// The configured backends, selected per chat at runtime
#[derive(Clone)]
pub struct Backends {
    cloud: Arc<dyn StorageBackend>,
    ftp: Option<Arc<dyn StorageBackend>>,
}

impl Backends {
    /// Create the backend set; `ftp` is `None` when FTP is not configured
    #[must_use]
    pub fn new(cloud: Arc<dyn StorageBackend>, ftp: Option<Arc<dyn StorageBackend>>) -> Self {
        Self { cloud, ftp }
    }

    /// Whether a chat may switch to FTP
    #[must_use]
    pub const fn ftp_enabled(&self) -> bool {
        self.ftp.is_some()
    }

    /// Resolve the backend for `kind`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the backend is not configured.
    pub fn get(&self, kind: StorageKind) -> Result<Arc<dyn StorageBackend>, StorageError> {
        match kind {
            StorageKind::CloudDisk => Ok(Arc::clone(&self.cloud)),
            StorageKind::Ftp => self
                .ftp
                .as_ref()
                .map(Arc::clone)
                .ok_or(StorageError::Unavailable(kind)),
        }
    }
}

/// Join a root-relative folder and a file name. Root is `""`.
#[must_use]
pub fn join_remote_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// Split a root-relative path into its parent folder and final segment.
#[must_use]
pub fn split_remote_path(path: &str) -> (&str, &str) {
    let path = path.trim_end_matches('/');
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent.trim_start_matches('/'), name),
        None => ("", path),
    }
}
