use serde::{Deserialize, Serialize};

/// The step a chat's next inbound message answers.
///
/// Held in the chat's session and consumed by the next message; handlers set
/// a new one when they prompt again.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum Continuation {
    /// Main menu shown, expecting a menu button
    #[default]
    MainMenu,
    /// Folder keyboard shown, expecting a folder name, Root or Cancel
    CatalogChoice,
    /// Backend keyboard shown, expecting Cloud Disk or FTP
    StorageChoice,
    /// No folder selected yet, expecting Yes/No to search from the root
    RootSearchConfirmation,
    /// Expecting the text to search for
    SearchQuery,
}
