//! Site configuration.
//!
//! Loaded from `config.toml` next to the content it serves. Every field has
//! a default, so the file is optional and sparse — override only what you
//! need. Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_dir = "content"   # Flat directory of md/html/js pages
//! media_dir = "media"       # Uploaded images
//! assets_dir = "assets"     # Static site assets (served when present)
//!
//! [server]
//! port = 3000
//! bind = "127.0.0.1"
//!
//! [auth]
//! refresh_token = ""        # Shared secret for mutating endpoints.
//!                           # The REFRESH_TOKEN env var overrides this.
//!
//! [git]
//! auto_commit = true        # Commit saves/deletes/uploads in the background
//! push_on_save = false      # Also push after each auto-commit
//! default_user_name = "Content Editor"
//! default_user_email = "editor@localhost"
//!
//! [reload]
//! processes = ["flatsite", "server", "app"]  # pm2 names tried in order
//! ```
//!
//! The refresh token deliberately has no default: a server started without
//! one refuses every mutating request instead of accepting an empty string.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory of content files (the store).
    pub content_dir: PathBuf,
    /// Directory of uploaded images.
    pub media_dir: PathBuf,
    /// Directory of static site assets, served under `/assets` when present.
    pub assets_dir: PathBuf,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub git: GitConfig,
    pub reload: ReloadConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            media_dir: PathBuf::from("media"),
            assets_dir: PathBuf::from("assets"),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            git: GitConfig::default(),
            reload: ReloadConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "content_dir must not be empty".into(),
            ));
        }
        if self.media_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("media_dir must not be empty".into()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be non-zero".into()));
        }
        Ok(())
    }

    /// Replace the auth token when an environment value is present.
    /// Environment wins over file — deployments inject the secret that way.
    pub fn with_env_token(mut self, env_token: Option<String>) -> Self {
        if let Some(token) = env_token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            self.auth.refresh_token = Some(token);
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bind: "127.0.0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared secret gating every mutating endpoint. `None` means locked:
    /// no token value a client sends can match.
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Stage and commit content mutations in the background.
    pub auto_commit: bool,
    /// Push after each auto-commit.
    pub push_on_save: bool,
    /// Identity configured on a commit that fails for lack of one.
    pub default_user_name: String,
    pub default_user_email: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            auto_commit: true,
            push_on_save: false,
            default_user_name: "Content Editor".to_string(),
            default_user_email: "editor@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReloadConfig {
    /// Process-manager names tried in order by the revision trigger.
    pub processes: Vec<String>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            processes: vec![
                "flatsite".to_string(),
                "server".to_string(),
                "app".to_string(),
            ],
        }
    }
}

/// Load `config.toml` from the given path, falling back to defaults when
/// the file does not exist. The `REFRESH_TOKEN` env var overrides the
/// file's token either way.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let config = if path.exists() {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw)?
    } else {
        SiteConfig::default()
    };
    let config = config.with_env_token(std::env::var("REFRESH_TOKEN").ok());
    config.validate()?;
    Ok(config)
}

/// The stock config file printed by `flatsite gen-config`.
pub fn stock_config_toml() -> String {
    let defaults = SiteConfig::default();
    format!(
        r#"# flatsite configuration
# All options are optional - defaults shown below.

# Flat directory of md/html/js pages
content_dir = "content"
# Uploaded images
media_dir = "media"
# Static site assets, served under /assets when present
assets_dir = "assets"

[server]
port = {port}
bind = "{bind}"

[auth]
# Shared secret for mutating endpoints. Generate one with
# `flatsite gen-token`. The REFRESH_TOKEN env var overrides this.
# refresh_token = ""

[git]
# Commit saves, deletes and uploads in the background
auto_commit = true
# Also push after each auto-commit
push_on_save = false
# Identity used when a commit fails for lack of one
default_user_name = "{name}"
default_user_email = "{email}"

[reload]
# pm2 process names the revision trigger tries, in order
processes = ["flatsite", "server", "app"]
"#,
        port = defaults.server.port,
        bind = defaults.server.bind,
        name = defaults.git.default_user_name,
        email = defaults.git.default_user_email,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.content_dir, PathBuf::from("content"));
        assert!(config.git.auto_commit);
    }

    #[test]
    fn sparse_override_keeps_other_defaults() {
        let config: SiteConfig = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.media_dir, PathBuf::from("media"));
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("unknown_option = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn token_parsed_from_file() {
        let config: SiteConfig =
            toml::from_str("[auth]\nrefresh_token = \"s3cret\"\n").unwrap();
        assert_eq!(config.auth.refresh_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn env_token_overrides_file_token() {
        let config: SiteConfig =
            toml::from_str("[auth]\nrefresh_token = \"from-file\"\n").unwrap();
        let config = config.with_env_token(Some("from-env".to_string()));
        assert_eq!(config.auth.refresh_token.as_deref(), Some("from-env"));
    }

    #[test]
    fn blank_env_token_is_ignored() {
        let config: SiteConfig =
            toml::from_str("[auth]\nrefresh_token = \"from-file\"\n").unwrap();
        let config = config.with_env_token(Some("  ".to_string()));
        assert_eq!(config.auth.refresh_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn zero_port_fails_validation() {
        let config: SiteConfig = toml::from_str("[server]\nport = 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: SiteConfig = toml::from_str(&stock_config_toml()).unwrap();
        assert_eq!(config.server.port, SiteConfig::default().server.port);
        assert_eq!(config.reload.processes, SiteConfig::default().reload.processes);
    }
}
