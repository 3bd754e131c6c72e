//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Remote SFTP storage configuration.
    pub sftp: SftpSettings,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogSettings,
}

/// SFTP storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SftpSettings {
    /// Remote host name or address.
    pub host: String,
    /// Remote SSH port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password. Takes precedence over `private_key`.
    #[serde(default)]
    pub password: Option<String>,
    /// Path to a private key file used when no password is set.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Remote directory every stored path is rooted at.
    #[serde(default = "default_fs_root")]
    pub fs_root: String,
    /// Prefix used when building public URLs, e.g. `https://cdn.example.com`.
    #[serde(default)]
    pub public_host: Option<String>,
}

fn default_port() -> u16 {
    22
}

fn default_fs_root() -> String {
    "/".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "clipstore=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("CLIPSTORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
