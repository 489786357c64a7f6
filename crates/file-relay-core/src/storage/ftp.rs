//! FTP storage backend
//!
//! Wraps the blocking `ftp` client. Every operation opens its own control
//! connection on the blocking thread pool and closes it when done.

use super::search::{depth_first_search, DirectoryLister};
use super::{
    join_remote_path, split_remote_path, EntryKind, RemoteEntry, Retrieved, StorageBackend,
    StorageError, StorageKind,
};
use crate::config::FtpSettings;
use ::ftp::types::FileType;
use ::ftp::{FtpError, FtpStream};
use async_trait::async_trait;
use lazy_regex::lazy_regex;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// `LIST` line: permission string, seven more columns, then the name
static RE_LIST_LINE: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"^(\S)\S*(?:\s+\S+){7}\s+(.+)$");

/// Classify an `NLST` name.
///
/// Names without a `.` are treated as directories, names with one as files.
/// Extensionless files and dotted directories are misclassified.
#[must_use]
pub fn classify_name(name: &str) -> EntryKind {
    if name.contains('.') {
        EntryKind::File
    } else {
        EntryKind::Directory
    }
}

/// Parse one line of a Unix-style `LIST` response.
///
/// Returns `None` for lines that do not follow the format (`total 12`, blank
/// lines) and for the `.`/`..` entries.
#[must_use]
pub fn parse_list_line(folder: &str, line: &str) -> Option<RemoteEntry> {
    let caps = RE_LIST_LINE.captures(line.trim_end())?;
    let name = caps.get(2)?.as_str();
    if name == "." || name == ".." {
        return None;
    }
    let path = join_remote_path(folder, name);
    if caps.get(1)?.as_str() == "d" {
        Some(RemoteEntry::directory(name, path))
    } else {
        Some(RemoteEntry::file(name, path))
    }
}

/// Build an entry from an `NLST` name listed under `folder`.
///
/// Some servers answer with the full path, so only the last segment is kept.
#[must_use]
pub fn nlst_entry(folder: &str, raw: &str) -> Option<RemoteEntry> {
    let name = raw.trim_end_matches(['\r', '/']).rsplit('/').next()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(RemoteEntry {
        name: name.to_string(),
        path: join_remote_path(folder, name),
        kind: classify_name(name),
    })
}

/// Control-connection commands the backend issues on a logged-in session
#[cfg_attr(test, mockall::automock)]
pub trait FtpCommands: Send {
    /// `CWD path`
    fn enter(&mut self, path: &str) -> Result<(), FtpError>;
    /// `MKD path`
    fn make_dir(&mut self, path: &str) -> Result<(), FtpError>;
    /// `STOR name` in the current folder
    fn store(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), FtpError>;
    /// Raw `LIST` lines of the current folder
    fn list_lines(&mut self) -> Result<Vec<String>, FtpError>;
    /// `NLST path`; `""` lists the login folder
    fn name_list(&mut self, path: &str) -> Result<Vec<String>, FtpError>;
    /// `RETR name` from the current folder
    fn fetch(&mut self, name: &str) -> Result<Vec<u8>, FtpError>;
    /// `QUIT`
    fn close(&mut self) -> Result<(), FtpError>;
}

impl FtpCommands for FtpStream {
    fn enter(&mut self, path: &str) -> Result<(), FtpError> {
        self.cwd(path)
    }

    fn make_dir(&mut self, path: &str) -> Result<(), FtpError> {
        self.mkdir(path)
    }

    fn store(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), FtpError> {
        self.put(name, &mut Cursor::new(bytes))
    }

    fn list_lines(&mut self) -> Result<Vec<String>, FtpError> {
        self.list(None)
    }

    fn name_list(&mut self, path: &str) -> Result<Vec<String>, FtpError> {
        self.nlst((!path.is_empty()).then_some(path))
    }

    fn fetch(&mut self, name: &str) -> Result<Vec<u8>, FtpError> {
        Ok(self.simple_retr(name)?.into_inner())
    }

    fn close(&mut self) -> Result<(), FtpError> {
        self.quit()
    }
}

/// Opens a logged-in control connection in binary mode
pub type Connector = Arc<dyn Fn() -> Result<Box<dyn FtpCommands>, FtpError> + Send + Sync>;

fn connect(settings: &FtpSettings) -> Result<Box<dyn FtpCommands>, FtpError> {
    let mut stream = FtpStream::connect((settings.host.as_str(), settings.port))?;
    stream.login(&settings.user, &settings.password)?;
    stream.transfer_type(FileType::Binary)?;
    Ok(Box::new(stream))
}

/// Enter `folder`, creating it first if `CWD` fails. Root is a no-op.
fn cwd_or_create(commands: &mut dyn FtpCommands, folder: &str) -> Result<(), FtpError> {
    if folder.is_empty() {
        return Ok(());
    }
    if let Err(e) = commands.enter(folder) {
        debug!("CWD '{folder}' failed ({e}), creating it");
        commands.make_dir(folder)?;
        commands.enter(folder)?;
    }
    Ok(())
}

/// One logged-in control connection
#[derive(Clone)]
struct FtpSession {
    commands: Arc<Mutex<Box<dyn FtpCommands>>>,
}

impl FtpSession {
    async fn open(connector: &Connector) -> Result<Self, StorageError> {
        let connector = Arc::clone(connector);
        let commands = tokio::task::spawn_blocking(move || connector()).await??;
        Ok(Self {
            commands: Arc::new(Mutex::new(commands)),
        })
    }

    /// Run a blocking step on the connection
    async fn run<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn FtpCommands) -> Result<T, StorageError> + Send + 'static,
    {
        let commands = Arc::clone(&self.commands);
        tokio::task::spawn_blocking(move || {
            let mut guard = commands
                .lock()
                .map_err(|_| StorageError::Transfer("FTP connection lock poisoned".into()))?;
            op(&mut **guard)
        })
        .await?
    }

    async fn close(self) {
        let result = self
            .run(|commands| commands.close().map_err(StorageError::from))
            .await;
        if let Err(e) = result {
            debug!("FTP QUIT failed: {e}");
        }
    }
}

/// Lists folders over one session during a search
struct SessionLister {
    session: FtpSession,
    root: String,
}

#[async_trait]
impl DirectoryLister for SessionLister {
    /// `NLST` of `path`, classified with [`classify_name`].
    ///
    /// A failure below the search root is logged and the path skipped, since
    /// it is usually an extensionless file taken for a folder. A failure at
    /// the root fails the search. Servers differ on empty folders: some
    /// (proftpd among them) answer `450 No files found` instead of an empty
    /// list, so searching an empty selected folder on them reports a search
    /// failure rather than no results.
    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>, StorageError> {
        let folder = path.to_string();
        let names = self
            .session
            .run(move |commands| commands.name_list(&folder).map_err(StorageError::from))
            .await;

        match names {
            Ok(names) => Ok(names.iter().filter_map(|n| nlst_entry(path, n)).collect()),
            Err(e) if path != self.root => {
                warn!("Skipping FTP path '{path}' during search: {e}");
                Ok(Vec::new())
            }
            Err(e) => Err(StorageError::Search(e.to_string())),
        }
    }
}

/// FTP server backend
pub struct FtpBackend {
    connector: Connector,
}

impl FtpBackend {
    /// Create a backend for the given server
    #[must_use]
    pub fn new(settings: FtpSettings) -> Self {
        Self::with_connector(Arc::new(move || connect(&settings)))
    }

    /// Create a backend that opens its sessions through `connector`
    #[must_use]
    pub fn with_connector(connector: Connector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl StorageBackend for FtpBackend {
    fn kind(&self) -> StorageKind {
        StorageKind::Ftp
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), StorageError> {
        let folder = folder.trim_matches('/').to_string();
        if folder.is_empty() {
            return Ok(());
        }
        let session = FtpSession::open(&self.connector).await?;
        let result = session
            .run(move |commands| {
                cwd_or_create(commands, &folder)
                    .map_err(|e| StorageError::Transfer(format!("cannot enter '{folder}': {e}")))
            })
            .await;
        session.close().await;
        result
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let (folder, name) = split_remote_path(path);
        let (folder, name) = (folder.to_string(), name.to_string());
        let size = bytes.len();

        let session = FtpSession::open(&self.connector).await?;
        let result = session
            .run(move |commands| {
                cwd_or_create(commands, &folder)
                    .and_then(|()| commands.store(&name, bytes))
                    .map_err(|e| StorageError::Transfer(format!("STOR '{name}' failed: {e}")))
            })
            .await;
        session.close().await;

        if result.is_ok() {
            info!("Uploaded {size} bytes to FTP path '{path}'.");
        }
        result
    }

    async fn list_top_level_folders(&self) -> Result<Vec<RemoteEntry>, StorageError> {
        let session = FtpSession::open(&self.connector).await?;
        let result = session
            .run(|commands| {
                commands
                    .list_lines()
                    .map_err(|e| StorageError::Listing(e.to_string()))
            })
            .await;
        session.close().await;

        Ok(result?
            .iter()
            .filter_map(|line| parse_list_line("", line))
            .filter(RemoteEntry::is_dir)
            .collect())
    }

    async fn recursive_search(
        &self,
        root: &str,
        query: &str,
    ) -> Result<Vec<RemoteEntry>, StorageError> {
        let root = root.trim_matches('/').to_string();
        let lister = SessionLister {
            session: FtpSession::open(&self.connector).await?,
            root: root.clone(),
        };
        let result = depth_first_search(&lister, &root, query).await;
        lister.session.close().await;
        result
    }

    async fn retrieve(&self, entry: &RemoteEntry) -> Result<Retrieved, StorageError> {
        let (folder, name) = split_remote_path(&entry.path);
        let (folder, name) = (folder.to_string(), name.to_string());

        let session = FtpSession::open(&self.connector).await?;
        let result = session
            .run(move |commands| {
                if !folder.is_empty() {
                    commands.enter(&folder)?;
                }
                Ok(commands.fetch(&name)?)
            })
            .await
            .map_err(|e| StorageError::Transfer(format!("RETR failed: {e}")));
        session.close().await;

        Ok(Retrieved::Content {
            file_name: entry.name.clone(),
            bytes: result?,
        })
    }
}
