use file_relay_core::conversation::views::MenuCommand;
use file_relay_core::conversation::Inbound;
use teloxide::{prelude::*, utils::command::BotCommands};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message and main menu
    #[command(description = "Start the bot.")]
    Start,
    /// Search stored files
    #[command(description = "Search for a file.")]
    Search,
    /// Choose the upload folder
    #[command(description = "Choose the upload folder.")]
    Catalog,
    /// Choose the storage backend
    #[command(description = "Choose Yandex Disk or FTP.")]
    Settings,
    /// Show the help text
    #[command(description = "Frequently asked questions.")]
    Faq,
}

impl From<Command> for MenuCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => Self::Start,
            Command::Search => Self::Search,
            Command::Catalog => Self::Catalog,
            Command::Settings => Self::Settings,
            Command::Faq => Self::Faq,
        }
    }
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Display name of the sender, for logs
pub fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Convert a non-command message into a conversation event
#[must_use]
pub fn inbound_from_message(msg: &Message) -> Inbound {
    if let Some(doc) = msg.document() {
        return Inbound::Document {
            file_id: doc.file.id.0.clone(),
            file_name: doc.file_name.clone(),
        };
    }
    msg.text()
        .map_or(Inbound::Unsupported, |text| Inbound::Text(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse() {
        assert_eq!(Command::parse("/start", "relay_bot").ok(), Some(Command::Start));
        assert_eq!(Command::parse("/faq", "relay_bot").ok(), Some(Command::Faq));
        assert!(Command::parse("/clear", "relay_bot").is_err());
    }

    #[test]
    fn test_commands_map_to_menu() {
        assert_eq!(MenuCommand::from(Command::Catalog), MenuCommand::Catalog);
        assert_eq!(MenuCommand::from(Command::Settings), MenuCommand::Settings);
        assert_eq!(MenuCommand::from(Command::Search), MenuCommand::Search);
    }

    #[test]
    fn test_command_descriptions_list_every_command() {
        let help = Command::descriptions().to_string();
        for name in ["/start", "/search", "/catalog", "/settings", "/faq"] {
            assert!(help.contains(name), "{name} missing from {help}");
        }
    }
}
