// src/config.rs

use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Top-level configuration read from `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub aws_credentials_path: PathBuf,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_targets_file")]
    pub targets_file: PathBuf,
    #[serde(default)]
    pub scan: ScanSettings,
    /// Sensitive-resource patterns per resource module name (`JS`, `PHP`, ...).
    /// Modules missing here keep their built-in patterns.
    #[serde(default)]
    pub resource_patterns: BTreeMap<String, Vec<String>>,
    /// Environment variables that replaced a file value during `load`.
    #[serde(skip)]
    env_overrides: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_timeout_secs")]
    pub module_timeout_secs: u64,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl ScanSettings {
    pub fn module_timeout(&self) -> Duration {
        Duration::from_secs(self.module_timeout_secs)
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            module_timeout_secs: default_timeout_secs(),
            smtp_port: default_smtp_port(),
        }
    }
}

fn default_targets_file() -> PathBuf {
    PathBuf::from("targets.txt")
}

fn default_telegram_api() -> String {
    DEFAULT_TELEGRAM_API.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_in_flight() -> usize {
    16
}

fn default_smtp_port() -> u16 {
    25
}

impl Config {
    /// Reads `path`, applies the `TELEGRAM_*` environment overrides and
    /// validates the result.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ScanError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&content).map_err(|source| ScanError::ConfigInvalid {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Environment values win over the file, matching how the bot credentials
    /// are usually injected. Applied names are kept for [`Config::env_overrides`]
    /// since this runs before logging is up.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(BOT_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.telegram.bot_token = token;
            self.env_overrides.push(BOT_TOKEN_ENV);
        }
        if let Some(chat_id) = lookup(CHAT_ID_ENV).filter(|v| !v.is_empty()) {
            self.telegram.chat_id = chat_id;
            self.env_overrides.push(CHAT_ID_ENV);
        }
    }

    pub fn env_overrides(&self) -> &[&'static str] {
        &self.env_overrides
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ScanError::Config(format!(
                "telegram.bot_token is empty and {BOT_TOKEN_ENV} is not set"
            )));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(ScanError::Config(format!(
                "telegram.chat_id is empty and {CHAT_ID_ENV} is not set"
            )));
        }
        if self.aws_credentials_path.as_os_str().is_empty() {
            return Err(ScanError::Config("aws_credentials_path is empty".to_string()));
        }
        if self.scan.max_in_flight == 0 {
            return Err(ScanError::Config("scan.max_in_flight must be at least 1".to_string()));
        }
        if self.scan.module_timeout_secs == 0 {
            return Err(ScanError::Config(
                "scan.module_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "telegram": { "bot_token": "123:abc", "chat_id": "42" },
        "aws_credentials_path": "/tmp/creds"
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_json(MINIMAL).unwrap();
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.telegram.timeout(), Duration::from_secs(10));
        assert_eq!(config.targets_file, PathBuf::from("targets.txt"));
        assert_eq!(config.scan.max_in_flight, 16);
        assert_eq!(config.scan.smtp_port, 25);
        assert!(config.resource_patterns.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::from_json(MINIMAL).unwrap();
        config.apply_env_overrides(|key| match key {
            BOT_TOKEN_ENV => Some("999:env".to_string()),
            CHAT_ID_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.telegram.bot_token, "999:env");
        // Empty values do not clobber the file.
        assert_eq!(config.telegram.chat_id, "42");
        assert_eq!(config.env_overrides(), &[BOT_TOKEN_ENV]);
    }

    #[test]
    fn missing_token_is_a_configuration_error() {
        let config = Config::from_json(
            r#"{ "telegram": { "chat_id": "42" }, "aws_credentials_path": "/tmp/creds" }"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("bot_token"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = Config::from_json(MINIMAL).unwrap();
        config.scan.max_in_flight = 0;
        assert!(matches!(config.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn load_reports_unreadable_and_invalid_files() {
        let missing = Config::load(Path::new("/definitely/not/here/config.json")).unwrap_err();
        assert!(matches!(missing, ScanError::ConfigUnreadable { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let invalid = Config::load(file.path()).unwrap_err();
        assert!(matches!(invalid, ScanError::ConfigInvalid { .. }));
    }

    #[test]
    fn resource_patterns_are_read_per_module() {
        let config = Config::from_json(
            r#"{
                "telegram": { "bot_token": "t", "chat_id": "c" },
                "aws_credentials_path": "/tmp/creds",
                "resource_patterns": { "YML": [".yml", ".env"] }
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.resource_patterns.get("YML"),
            Some(&vec![".yml".to_string(), ".env".to_string()])
        );
    }
}
