//! Configuration management for devwatch
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (TG_CHAT_ID, REQUEST_TIMEOUT, DEVWATCH_*)
//! 3. Config file (~/.config/devwatch/config.toml)
//! 4. Default values
//!
//! Tokens live in [`Secrets`](crate::Secrets), not here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::poller::RetryPolicy;
use crate::secrets::Secrets;
use crate::{Error, Result};

/// Default Devman long-polling endpoint
pub const DEFAULT_ENDPOINT_URL: &str = "https://dvmn.org/api/long_polling/";

/// Default Devman user reviews endpoint
pub const DEFAULT_REVIEWS_URL: &str = "https://dvmn.org/api/user_reviews/";

/// Default Telegram Bot API base
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Review API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Long-polling endpoint
    pub endpoint_url: String,

    /// Endpoint listing all reviews of the user
    pub reviews_url: String,

    /// Client-side bound for each poll request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            reviews_url: DEFAULT_REVIEWS_URL.to_string(),
            request_timeout: None, // Wait as long as the server holds the request
        }
    }
}

/// Telegram configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API base URL
    pub api_url: String,

    /// Chat that receives notifications
    pub chat_id: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            chat_id: None,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// File receiving INFO and above; `None` disables file logging
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("devwatch.log")),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Review API configuration
    pub api: ApiConfig,

    /// Backoff delays of the poll loop
    pub poll: RetryPolicy,

    /// Telegram configuration
    pub telegram: TelegramConfig,

    /// Log output configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/devwatch/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("devwatch").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - TG_CHAT_ID: Chat that receives notifications
    /// - REQUEST_TIMEOUT: Poll request timeout in seconds
    /// - DEVWATCH_ENDPOINT_URL: Long-polling endpoint
    /// - DEVWATCH_TELEGRAM_API_URL: Bot API base URL
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(chat_id) = lookup("TG_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id.trim().to_string());
        }

        if let Some(timeout) = lookup("REQUEST_TIMEOUT") {
            self.api.request_timeout = Some(parse_timeout_secs(&timeout)?);
        }

        if let Some(url) = lookup("DEVWATCH_ENDPOINT_URL") {
            self.api.endpoint_url = url;
        }

        if let Some(url) = lookup("DEVWATCH_TELEGRAM_API_URL") {
            self.telegram.api_url = url;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        chat_id: Option<String>,
        request_timeout: Option<Duration>,
        log_file: Option<PathBuf>,
    ) -> Self {
        if let Some(id) = chat_id {
            self.telegram.chat_id = Some(id);
        }

        if let Some(timeout) = request_timeout {
            self.api.request_timeout = Some(timeout);
        }

        if let Some(file) = log_file {
            self.log.file = Some(file);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        chat_id: Option<String>,
        request_timeout: Option<Duration>,
        log_file: Option<PathBuf>,
    ) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(chat_id, request_timeout, log_file))
    }
}

/// Parse a timeout given in (possibly fractional) seconds
///
/// Zero is rejected: every poll would time out at once and the loop
/// would retry without pause.
pub fn parse_timeout_secs(value: &str) -> Result<Duration> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid timeout '{}': expected seconds", value)))?;

    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => Err(Error::Config(format!(
            "Invalid timeout '{}': must be a positive number of seconds",
            value
        ))),
    }
}

/// Everything the watcher needs, validated once at startup
#[derive(Clone)]
pub struct Settings {
    /// Devman API token
    pub api_token: String,
    /// Telegram bot token
    pub bot_token: String,
    /// Chat that receives notifications
    pub chat_id: String,
    /// Long-polling endpoint
    pub endpoint_url: Url,
    /// User reviews endpoint
    pub reviews_url: Url,
    /// Telegram Bot API base
    pub telegram_api_url: Url,
    /// Client-side bound for each poll request
    pub request_timeout: Option<Duration>,
    /// Backoff delays of the poll loop
    pub retry: RetryPolicy,
}

impl Settings {
    /// Combine configuration and secrets, failing on anything missing
    pub fn resolve(config: &Config, secrets: &Secrets) -> Result<Self> {
        let api_token = secrets.devman_token().ok_or_else(|| {
            Error::Config(
                "Devman token not found. Set DEVMAN_TOKEN environment variable \
                 or add token to ~/.config/devwatch/secrets.toml"
                    .to_string(),
            )
        })?;

        let bot_token = secrets.bot_token().ok_or_else(|| {
            Error::Config(
                "Telegram bot token not found. Set TGBOT_TOKEN environment variable \
                 or add bot_token to ~/.config/devwatch/secrets.toml"
                    .to_string(),
            )
        })?;

        let chat_id = config
            .telegram
            .chat_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::Config("Telegram chat id not set. Set TG_CHAT_ID".to_string())
            })?;

        if config.api.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config(
                "api.request_timeout must be positive; omit it to wait indefinitely".to_string(),
            ));
        }

        Ok(Self {
            api_token,
            bot_token,
            chat_id,
            endpoint_url: parse_url("api.endpoint_url", &config.api.endpoint_url)?,
            reviews_url: parse_url("api.reviews_url", &config.api.reviews_url)?,
            telegram_api_url: parse_url("telegram.api_url", &config.telegram.api_url)?,
            request_timeout: config.api.request_timeout,
            retry: config.poll,
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("chat_id", &self.chat_id)
            .field("endpoint_url", &self.endpoint_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::Config(format!("Invalid {} '{}': {}", name, value, e)))
}
