//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.agencydesk.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_CONFIG_FILE: &str = ".agencydesk.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Acting user.
    #[serde(default)]
    pub session: SessionConfig,

    /// Rendering settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Public signup pages.
    #[serde(default)]
    pub public: PublicConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// JSON file the store reads and writes.
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            verbose: false,
        }
    }
}

fn default_data_file() -> String {
    "agencydesk.json".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Profile id used when `--user` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Currency for new subscriptions that do not name one.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Journal entries shown under recent activity.
    #[serde(default = "default_recent_entries")]
    pub recent_entries: usize,

    /// Days ahead the dashboard looks for renewals.
    #[serde(default = "default_renewal_days")]
    pub renewal_days: i64,

    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            recent_entries: default_recent_entries(),
            renewal_days: default_renewal_days(),
            format: OutputFormat::default(),
        }
    }
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_recent_entries() -> usize {
    5
}

fn default_renewal_days() -> i64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicConfig {
    /// Base URL public signup links are built on.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for PublicConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://app.agencydesk.io".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and the environment variables backing them) take
    /// precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.general.data_file = data.to_string_lossy().into_owned();
        }
        if let Some(user) = args.user {
            self.session.user_id = Some(user);
        }
        if let Some(format) = args.format {
            self.display.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.general.data_file)
    }

    /// Public signup link of a subscription.
    pub fn public_link(&self, subscription_id: Uuid) -> String {
        format!(
            "{}/subscribe/{}",
            self.public.base_url.trim_end_matches('/'),
            subscription_id
        )
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Command};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.data_file, "agencydesk.json");
        assert_eq!(config.display.currency, "EUR");
        assert_eq!(config.display.recent_entries, 5);
        assert_eq!(config.display.format, OutputFormat::Markdown);
        assert!(config.session.user_id.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_file = "/var/lib/agencydesk/data.json"
verbose = true

[session]
user_id = "7f1c0b7e-55a4-4d47-9a57-0d0f3a8a4e21"

[display]
currency = "USD"
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_file, "/var/lib/agencydesk/data.json");
        assert!(config.general.verbose);
        assert_eq!(
            config.session.user_id,
            Some(Uuid::parse_str("7f1c0b7e-55a4-4d47-9a57-0d0f3a8a4e21").unwrap())
        );
        assert_eq!(config.display.currency, "USD");
        assert_eq!(config.display.recent_entries, 5);
        assert_eq!(config.display.format, OutputFormat::Json);
        assert_eq!(config.public.base_url, "https://app.agencydesk.io");
    }

    #[test]
    fn test_merge_with_args() {
        let user = Uuid::new_v4();
        let args = Args {
            config: None,
            data: Some(PathBuf::from("other.json")),
            user: Some(user),
            format: Some(OutputFormat::Json),
            verbose: true,
            quiet: false,
            command: Command::InitConfig,
        };

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.data_path(), PathBuf::from("other.json"));
        assert_eq!(config.session.user_id, Some(user));
        assert_eq!(config.display.format, OutputFormat::Json);
        assert!(config.general.verbose);
    }

    #[test]
    fn test_public_link() {
        let mut config = Config::default();
        config.public.base_url = "https://desk.example.com/".to_string();
        let id = Uuid::nil();
        assert_eq!(
            config.public_link(id),
            "https://desk.example.com/subscribe/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[display]\nrecent_entries = 10\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.display.recent_entries, 10);
        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[display]"));
        assert!(toml_str.contains("[public]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.display.renewal_days, 30);
    }
}
