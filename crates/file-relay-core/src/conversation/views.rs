//! Relay UI components
//!
//! Button labels, the closed set of menu commands they map to, keyboards and
//! message texts.

use crate::storage::{RemoteEntry, StorageKind};
use crate::transport::Keyboard;
use html_escape::encode_text;
use std::str::FromStr;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Button labels
// ─────────────────────────────────────────────────────────────────────────────

/// Main menu: search files
pub const LABEL_SEARCH: &str = "🔍 Search";
/// Main menu: choose upload folder
pub const LABEL_CATALOG: &str = "📁 Catalog";
/// Main menu: choose storage backend
pub const LABEL_SETTINGS: &str = "⚙️ Settings";
/// Main menu: help text
pub const LABEL_FAQ: &str = "❓ FAQ";
/// Leave a prompt without changes
pub const LABEL_CANCEL: &str = "Cancel";
/// Folder keyboard: upload to the root
pub const LABEL_ROOT_FOLDER: &str = "Root folder";
/// Storage keyboard: Yandex Disk
pub const LABEL_CLOUD_DISK: &str = "☁️ Yandex Disk";
/// Storage keyboard: FTP server
pub const LABEL_FTP: &str = "🗄 FTP";
/// Confirmation: accept
pub const LABEL_YES: &str = "Yes";
/// Confirmation: decline
pub const LABEL_NO: &str = "No";

/// Text that is not one of the expected buttons
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized input: {0}")]
pub struct InvalidInput(pub String);

/// Commands reachable from slash commands and the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    /// Greeting and main menu
    Start,
    /// Search stored files
    Search,
    /// Choose the upload folder
    Catalog,
    /// Choose the storage backend
    Settings,
    /// Help text
    Faq,
}

impl MenuCommand {
    /// Button label, `None` for commands without a button
    #[must_use]
    pub const fn label(self) -> Option<&'static str> {
        match self {
            Self::Start => None,
            Self::Search => Some(LABEL_SEARCH),
            Self::Catalog => Some(LABEL_CATALOG),
            Self::Settings => Some(LABEL_SETTINGS),
            Self::Faq => Some(LABEL_FAQ),
        }
    }
}

impl FromStr for MenuCommand {
    type Err = InvalidInput;

    /// Accepts a button label or the bare command word, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let command = match text {
            LABEL_SEARCH => Self::Search,
            LABEL_CATALOG => Self::Catalog,
            LABEL_SETTINGS => Self::Settings,
            LABEL_FAQ => Self::Faq,
            _ => match text.trim_start_matches('/').to_lowercase().as_str() {
                "start" => Self::Start,
                "search" => Self::Search,
                "catalog" => Self::Catalog,
                "settings" => Self::Settings,
                "faq" => Self::Faq,
                _ => return Err(InvalidInput(text.to_string())),
            },
        };
        Ok(command)
    }
}

/// Map a storage keyboard label to a backend
///
/// # Errors
///
/// Returns `InvalidInput` for any other text.
pub fn parse_storage_label(text: &str) -> Result<StorageKind, InvalidInput> {
    match text.trim() {
        LABEL_CLOUD_DISK => Ok(StorageKind::CloudDisk),
        LABEL_FTP => Ok(StorageKind::Ftp),
        other => Err(InvalidInput(other.to_string())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// Main menu; Settings is offered only when there is a second backend
#[must_use]
pub fn main_menu_keyboard(ftp_enabled: bool) -> Keyboard {
    let mut first = vec![LABEL_SEARCH, LABEL_CATALOG];
    if ftp_enabled {
        first.push(LABEL_SETTINGS);
    }
    Keyboard::new().row(first).row([LABEL_FAQ])
}

/// Cancel, root, then one row per existing folder
#[must_use]
pub fn catalog_keyboard(folders: &[RemoteEntry]) -> Keyboard {
    folders.iter().fold(
        Keyboard::new().row([LABEL_CANCEL]).row([LABEL_ROOT_FOLDER]),
        |keyboard, folder| keyboard.row([folder.name.as_str()]),
    )
}

/// Backend choice
#[must_use]
pub fn storage_keyboard() -> Keyboard {
    Keyboard::new()
        .row([LABEL_CLOUD_DISK, LABEL_FTP])
        .row([LABEL_CANCEL])
}

/// Yes / No
#[must_use]
pub fn confirmation_keyboard() -> Keyboard {
    Keyboard::new().row([LABEL_YES, LABEL_NO])
}

// ─────────────────────────────────────────────────────────────────────────────
// Texts
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for relay view rendering
///
/// All texts are Telegram HTML; dynamic parts are escaped.
pub trait RelayView {
    /// Greeting on /start
    fn welcome() -> &'static str;
    /// Shown when returning to the main menu
    fn main_menu() -> &'static str;
    /// Text outside the menu buttons
    fn invalid_command() -> &'static str;
    /// Text outside the offered options of a prompt
    fn invalid_choice() -> &'static str;
    /// Folder prompt
    fn choose_folder() -> &'static str;
    /// Folder selection acknowledgement
    fn folder_selected(folder: &str) -> String;
    /// Invitation to send a file after choosing a folder
    fn send_file_prompt() -> &'static str;
    /// Folder listing failed
    fn listing_failed() -> &'static str;
    /// File stored
    fn upload_succeeded(file_name: &str, folder: &str, storage: StorageKind) -> String;
    /// File could not be stored
    fn upload_failed() -> &'static str;
    /// Backend prompt
    fn choose_storage(current: StorageKind) -> String;
    /// Selected backend is already active
    fn storage_already_active(kind: StorageKind) -> String;
    /// Backend switched
    fn storage_switched(kind: StorageKind) -> String;
    /// FTP requested but not configured
    fn ftp_unavailable() -> &'static str;
    /// Ask whether to search from the root
    fn confirm_root_search() -> &'static str;
    /// Root search declined
    fn search_cancelled() -> &'static str;
    /// Query prompt
    fn search_prompt() -> &'static str;
    /// Search or retrieval failed
    fn search_failed() -> &'static str;
    /// Search found nothing
    fn nothing_found() -> &'static str;
    /// Single cloud hit
    fn found_link(url: &str) -> String;
    /// Single FTP hit, content follows as a document
    fn found_file(name: &str) -> String;
    /// Several hits
    fn found_many(entries: &[RemoteEntry]) -> String;
    /// Help text
    fn faq() -> &'static str;
}

/// Default English implementation of `RelayView`
pub struct DefaultRelayView;

fn folder_phrase(folder: &str) -> String {
    if folder.is_empty() {
        "the root folder".to_string()
    } else {
        format!("folder '<b>{}</b>'", encode_text(folder))
    }
}

impl RelayView for DefaultRelayView {
    fn welcome() -> &'static str {
        "👋 Hi! I save the files you send me to cloud storage.\n\n\
         Send any document to upload it, or pick an action below."
    }

    fn main_menu() -> &'static str {
        "Back to the main menu."
    }

    fn invalid_command() -> &'static str {
        "Unknown command. Please use the menu buttons."
    }

    fn invalid_choice() -> &'static str {
        "Invalid choice. Please choose again."
    }

    fn choose_folder() -> &'static str {
        "Choose a folder or type the name of a new one:"
    }

    fn folder_selected(folder: &str) -> String {
        format!("📁 Upload folder set to {}.", folder_phrase(folder))
    }

    fn send_file_prompt() -> &'static str {
        "Now send the file you want to upload to this folder."
    }

    fn listing_failed() -> &'static str {
        "❌ Could not get the list of folders. Please try again later."
    }

    fn upload_succeeded(file_name: &str, folder: &str, storage: StorageKind) -> String {
        format!(
            "✅ File '<b>{}</b>' saved to {} on {storage}.",
            encode_text(file_name),
            folder_phrase(folder)
        )
    }

    fn upload_failed() -> &'static str {
        "❌ An error occurred while saving the file. Please try again later."
    }

    fn choose_storage(current: StorageKind) -> String {
        format!("Where should files be stored?\nCurrently using: <b>{current}</b>")
    }

    fn storage_already_active(kind: StorageKind) -> String {
        format!("ℹ️ Already using <b>{kind}</b>.")
    }

    fn storage_switched(kind: StorageKind) -> String {
        format!("✅ Storage switched to <b>{kind}</b>.")
    }

    fn ftp_unavailable() -> &'static str {
        "🚫 FTP storage is not configured for this bot."
    }

    fn confirm_root_search() -> &'static str {
        "You have not chosen a folder to search in. Search from the root folder?"
    }

    fn search_cancelled() -> &'static str {
        "OK, search cancelled."
    }

    fn search_prompt() -> &'static str {
        "Enter the file name to search for:"
    }

    fn search_failed() -> &'static str {
        "❌ An error occurred while searching for files. Please try again later."
    }

    fn nothing_found() -> &'static str {
        "No files found."
    }

    fn found_link(url: &str) -> String {
        format!("🔗 Found file: {}", encode_text(url))
    }

    fn found_file(name: &str) -> String {
        format!("📄 Found file '<b>{}</b>', sending it now.", encode_text(name))
    }

    fn found_many(entries: &[RemoteEntry]) -> String {
        let list = entries
            .iter()
            .map(|e| format!("- {} ({})", encode_text(&e.name), encode_text(&e.path)))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Found {} files:\n{list}", entries.len())
    }

    fn faq() -> &'static str {
        r"<b>Frequently asked questions</b>

<b>1. How do I upload a file?</b>
Just send it to this chat as a document. It is saved to the currently selected folder, or to the root folder if none is selected.

<b>2. How do I find a file?</b>
Use /search. The search covers the selected folder and all of its subfolders, ignoring letter case.

<b>3. How do I change the upload folder?</b>
Use /catalog to pick an existing folder or type the name of a new one.

<b>4. How do I switch between Yandex Disk and FTP?</b>
Use /settings, if FTP storage is configured for this bot."
    }
}
