//! Configuration and settings management
//!
//! Loads relay settings from config files and environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Default Yandex Disk REST endpoint
pub const DEFAULT_YANDEX_API_URL: &str = "https://cloud-api.yandex.net/v1/disk";
/// Default FTP control port
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Page size used when listing cloud folders
pub const CLOUD_LIST_PAGE_SIZE: u32 = 1000;

// Telegram transport retry configuration
/// Maximum attempts for Telegram API operations
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Initial backoff for Telegram API retries in milliseconds
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff for Telegram API retries in milliseconds
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;

/// Build the layered configuration shared by all crates.
///
/// Sources, lowest priority first: `config/default`, `config/{RUN_MODE}`,
/// `config/local`, `APP__*` variables, plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE is mapped to snake_case, empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Storage settings for the relay
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelaySettings {
    /// Yandex Disk OAuth token
    pub yandex_token: String,
    /// Yandex Disk REST endpoint
    #[serde(default = "default_yandex_api_url")]
    pub yandex_api_url: String,

    /// FTP server host; FTP is disabled when unset
    pub ftp_host: Option<String>,
    /// FTP server port
    #[serde(default = "default_ftp_port")]
    pub ftp_port: u16,
    /// FTP user name
    pub ftp_user: Option<String>,
    /// FTP password
    pub ftp_password: Option<String>,
}

fn default_yandex_api_url() -> String {
    DEFAULT_YANDEX_API_URL.to_string()
}

const fn default_ftp_port() -> u16 {
    DEFAULT_FTP_PORT
}

/// Connection parameters for the FTP backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpSettings {
    /// Server host
    pub host: String,
    /// Control port
    pub port: u16,
    /// Login user, `anonymous` when not configured
    pub user: String,
    /// Login password
    pub password: String,
}

impl RelaySettings {
    /// Load relay settings from config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or `YANDEX_TOKEN` is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        if settings.yandex_token.trim().is_empty() {
            return Err(ConfigError::Message("YANDEX_TOKEN is empty".into()));
        }
        Ok(settings)
    }

    /// FTP connection parameters, if an FTP host is configured
    #[must_use]
    pub fn ftp(&self) -> Option<FtpSettings> {
        let host = self.ftp_host.as_deref().map(str::trim)?;
        if host.is_empty() {
            return None;
        }
        Some(FtpSettings {
            host: host.to_string(),
            port: self.ftp_port,
            user: self
                .ftp_user
                .clone()
                .unwrap_or_else(|| "anonymous".to_string()),
            password: self.ftp_password.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RelaySettings {
        RelaySettings {
            yandex_token: "token".to_string(),
            yandex_api_url: default_yandex_api_url(),
            ftp_host: None,
            ftp_port: DEFAULT_FTP_PORT,
            ftp_user: None,
            ftp_password: None,
        }
    }

    #[test]
    fn test_ftp_disabled_without_host() {
        let mut s = settings();
        assert_eq!(s.ftp(), None);

        s.ftp_host = Some("   ".to_string());
        assert_eq!(s.ftp(), None);
    }

    #[test]
    fn test_ftp_defaults_to_anonymous() {
        let mut s = settings();
        s.ftp_host = Some(" ftp.example.com ".to_string());

        let ftp = s.ftp();
        assert_eq!(
            ftp,
            Some(FtpSettings {
                host: "ftp.example.com".to_string(),
                port: 21,
                user: "anonymous".to_string(),
                password: String::new(),
            })
        );
    }

    #[test]
    fn test_ftp_credentials_passed_through() {
        let mut s = settings();
        s.ftp_host = Some("10.0.0.5".to_string());
        s.ftp_port = 2121;
        s.ftp_user = Some("relay".to_string());
        s.ftp_password = Some("secret".to_string());

        let ftp = s.ftp();
        assert_eq!(ftp.as_ref().map(|f| f.port), Some(2121));
        assert_eq!(ftp.as_ref().map(|f| f.user.as_str()), Some("relay"));
        assert_eq!(ftp.map(|f| f.password), Some("secret".to_string()));
    }
}
