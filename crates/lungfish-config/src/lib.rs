use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variables consulted for the bot token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["LUNGFISH_TOKEN", "SLACK_TOKEN"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("No bot token configured (set `token` or {})", TOKEN_ENV_VARS.join("/"))]
    MissingToken,
}

/// Bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// API token used for every Web API call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Channel the bot posts replies to.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Base URL of the Web API.
    #[serde(default = "default_service_url")]
    pub api_base_url: String,
    /// `Origin` header sent on the realtime handshake.
    #[serde(default = "default_service_url")]
    pub origin: String,
    /// Capacity of the stream-to-dispatch channel.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

fn default_channel() -> String {
    "#general".to_string()
}

fn default_service_url() -> String {
    "https://slack.com".to_string()
}

fn default_stream_buffer() -> usize {
    1
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            channel: default_channel(),
            api_base_url: default_service_url(),
            origin: default_service_url(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

impl BotConfig {
    /// Fill `token` from the environment if the file did not set one.
    ///
    /// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()`
    /// for the process environment.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.token.as_deref().is_some_and(|t| !t.is_empty()) {
            return;
        }
        self.token = TOKEN_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.is_empty());
    }

    /// The configured token, or [`ConfigError::MissingToken`].
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)
    }
}

/// Resolve the lungfish config directory (~/.lungfish/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".lungfish"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.lungfish/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from the default path, then apply the environment.
pub fn load_config() -> Result<BotConfig, ConfigError> {
    let path = config_file_path()?;
    load_config_from(&path)
}

/// Load configuration from a specific path, then apply the environment.
///
/// A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<BotConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let mut config = read_config_file(path)?;
    config.apply_env_with(|name| std::env::var(name).ok());
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<BotConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(BotConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: BotConfig = json5::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BotConfig::default();
        assert_eq!(config.channel, "#general");
        assert_eq!(config.api_base_url, "https://slack.com");
        assert_eq!(config.stream_buffer, 1);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_json5_parse() {
        let json5_str = r##"{
            // comments are allowed
            token: "xoxb-123",
            channel: "#bots",
            stream_buffer: 8,
        }"##;
        let config: BotConfig = json5::from_str(json5_str).unwrap();
        assert_eq!(config.token.as_deref(), Some("xoxb-123"));
        assert_eq!(config.channel, "#bots");
        assert_eq!(config.stream_buffer, 8);
        assert_eq!(config.origin, "https://slack.com");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("lungfish-config-does-not-exist.json5");
        let config = read_config_file(&path).unwrap();
        assert_eq!(config.channel, "#general");
    }

    #[test]
    fn test_read_config_file() {
        let path = std::env::temp_dir().join(format!(
            "lungfish-config-test-{}.json5",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ api_base_url: "http://127.0.0.1:9999" }"#).unwrap();
        let config = read_config_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_read_config_file_with_hash_channel() {
        let path = std::env::temp_dir().join(format!(
            "lungfish-config-channel-{}.json5",
            std::process::id()
        ));
        std::fs::write(&path, r##"{ channel: "#ops", token: "xoxb-9" }"##).unwrap();
        let config = read_config_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.channel, "#ops");
        assert_eq!(config.require_token().unwrap(), "xoxb-9");
    }

    #[test]
    fn test_env_fills_missing_token() {
        let mut config = BotConfig::default();
        config.apply_env_with(|name| match name {
            "SLACK_TOKEN" => Some("from-slack-env".into()),
            _ => None,
        });
        assert_eq!(config.token.as_deref(), Some("from-slack-env"));
    }

    #[test]
    fn test_env_prefers_lungfish_token() {
        let mut config = BotConfig::default();
        config.apply_env_with(|name| Some(format!("{name}-value")));
        assert_eq!(config.token.as_deref(), Some("LUNGFISH_TOKEN-value"));
    }

    #[test]
    fn test_env_does_not_override_file_token() {
        let mut config = BotConfig {
            token: Some("from-file".into()),
            ..Default::default()
        };
        config.apply_env_with(|_| Some("from-env".into()));
        assert_eq!(config.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_require_token() {
        let config = BotConfig::default();
        assert!(matches!(
            config.require_token(),
            Err(ConfigError::MissingToken)
        ));

        let config = BotConfig {
            token: Some(String::new()),
            ..Default::default()
        };
        assert!(config.require_token().is_err());

        let config = BotConfig {
            token: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(config.require_token().unwrap(), "abc");
    }
}
