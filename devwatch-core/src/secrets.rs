//! Secrets management for devwatch
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/devwatch/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (DEVMAN_TOKEN, TGBOT_TOKEN)
//! 2. Secrets file (~/.config/devwatch/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Devman API secrets
    pub devman: DevmanSecrets,
    /// Telegram secrets
    pub telegram: TelegramSecrets,
}

/// Devman-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DevmanSecrets {
    /// Personal API token from dvmn.org
    pub token: Option<String>,
}

/// Telegram-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramSecrets {
    /// Bot token issued by @BotFather
    pub bot_token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        // Check file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        trim_in_place(&mut secrets.devman.token);
        trim_in_place(&mut secrets.telegram.bot_token);

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/devwatch/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("devwatch").join("secrets.toml"))
    }

    /// Devman token; DEVMAN_TOKEN env var wins over the secrets file
    pub fn devman_token(&self) -> Option<String> {
        pick_token("DEVMAN_TOKEN", self.devman.token.as_deref())
    }

    /// Telegram bot token; TGBOT_TOKEN env var wins over the secrets file
    pub fn bot_token(&self) -> Option<String> {
        pick_token("TGBOT_TOKEN", self.telegram.bot_token.as_deref())
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;

        Self::create_template_at(&path)?;
        Ok(path)
    }

    /// Create a template secrets file at `path`
    pub fn create_template_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        // Don't overwrite existing file
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# devwatch secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[devman]
# Personal token from https://dvmn.org/api/docs/
token = ""

[telegram]
# Bot token issued by @BotFather
bot_token = ""
"#;

        std::fs::write(path, template).map_err(Error::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your tokens");

        Ok(())
    }
}

fn trim_in_place(token: &mut Option<String>) {
    if let Some(ref mut value) = token {
        *value = value.trim().to_string();
    }
}

fn pick_token(env_var: &str, from_file: Option<&str>) -> Option<String> {
    if let Ok(token) = std::env::var(env_var) {
        let token = token.trim().to_string();
        if !token.is_empty() {
            debug!(env_var, "Using token from environment");
            return Some(token);
        }
    }

    match from_file {
        Some(token) if !token.is_empty() => {
            debug!(env_var, "Using token from secrets file");
            Some(token.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_secrets() {
        let secrets = Secrets::default();
        assert!(secrets.devman.token.is_none());
        assert!(secrets.telegram.bot_token.is_none());
    }

    #[test]
    fn test_parse_secrets() {
        let toml = r#"
[devman]
token = "dvmn_xxxxxxxx"

[telegram]
bot_token = "123456:ABC-DEF"
"#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.devman.token, Some("dvmn_xxxxxxxx".to_string()));
        assert_eq!(secrets.telegram.bot_token, Some("123456:ABC-DEF".to_string()));
    }

    #[test]
    fn test_empty_file_token_ignored() {
        assert_eq!(pick_token("DEVWATCH_TEST_UNSET_TOKEN", Some("")), None);
        assert_eq!(
            pick_token("DEVWATCH_TEST_UNSET_TOKEN", Some("abc")),
            Some("abc".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_insecure_permissions_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[devman]\ntoken = \"test\"").unwrap();

        let perms = std::fs::Permissions::from_mode(0o644);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let result = Secrets::load_from_file(file.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("insecure permissions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_permissions_accepted_and_trimmed() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[telegram]\nbot_token = \"  123:abc  \"").unwrap();

        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let secrets = Secrets::load_from_file(file.path()).unwrap();
        assert_eq!(secrets.telegram.bot_token, Some("123:abc".to_string()));
    }

    #[test]
    fn test_create_template_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("secrets.toml");

        Secrets::create_template_at(&path).unwrap();
        assert!(path.exists());
        assert!(Secrets::create_template_at(&path).is_err());

        #[cfg(unix)]
        {
            let secrets = Secrets::load_from_file(&path).unwrap();
            assert_eq!(secrets.devman.token, Some(String::new()));
        }
    }
}
