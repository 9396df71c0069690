use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::weatherapi::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Environment variable holding the chat bot token.
pub const TOKEN_ENV: &str = "TOKEN";
/// Environment variable holding the WeatherAPI.com key.
pub const API_KEY_ENV: &str = "API_KEY";

/// Weather provider settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Keep-alive HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self { enabled: true, bind: "0.0.0.0:8080".to_string() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// bot_token = "..."
///
/// [provider]
/// api_key = "..."
///
/// [liveness]
/// bind = "0.0.0.0:8080"
/// ```
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub bot_token: Option<String>,
    pub provider: ProviderConfig,
    pub liveness: LivenessConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("provider", &self.provider)
            .field("liveness", &self.liveness)
            .finish()
    }
}

impl Config {
    /// Load config from disk (empty default if missing), then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_with(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherbot", "weatherbot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override secrets with values from `lookup` (normally the process env).
    /// Empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(TOKEN_ENV) {
            self.bot_token = Some(token);
        }
        if let Some(key) = non_empty(API_KEY_ENV) {
            self.provider.api_key = Some(key);
        }
    }

    pub fn require_token(&self) -> Result<&str> {
        self.bot_token.as_deref().ok_or_else(|| {
            anyhow!(
                "No bot token configured.\n\
                 Hint: set {TOKEN_ENV} or run `weatherbot configure`."
            )
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.provider.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No weather API key configured.\n\
                 Hint: set {API_KEY_ENV} or run `weatherbot configure`."
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_secrets_produce_hints() {
        let cfg = Config::default();

        let err = cfg.require_token().unwrap_err();
        assert!(err.to_string().contains("No bot token configured"));

        let err = cfg.require_api_key().unwrap_err();
        assert!(err.to_string().contains("Hint: set API_KEY"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config { bot_token: Some("FILE_TOKEN".into()), ..Config::default() };
        cfg.provider.api_key = Some("FILE_KEY".into());

        let env: HashMap<&str, &str> = [("TOKEN", "ENV_TOKEN"), ("API_KEY", "ENV_KEY")].into();
        cfg.apply_env_with(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(cfg.require_token().expect("token set"), "ENV_TOKEN");
        assert_eq!(cfg.require_api_key().expect("key set"), "ENV_KEY");
    }

    #[test]
    fn empty_env_values_do_not_clear_config() {
        let mut cfg = Config { bot_token: Some("FILE_TOKEN".into()), ..Config::default() };

        cfg.apply_env_with(|_| Some("  ".to_string()));

        assert_eq!(cfg.bot_token.as_deref(), Some("FILE_TOKEN"));
        assert_eq!(cfg.provider.api_key, None);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config { bot_token: Some("T".into()), ..Config::default() };
        cfg.provider.api_key = Some("K".into());
        cfg.liveness.enabled = false;
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.bot_token.as_deref(), Some("T"));
        assert_eq!(loaded.provider.api_key.as_deref(), Some("K"));
        assert_eq!(loaded.provider.base_url, DEFAULT_BASE_URL);
        assert!(!loaded.liveness.enabled);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[provider]\napi_key = \"K\"\n").expect("write");

        let cfg = Config::load_from(&path).expect("load");
        assert_eq!(cfg.provider.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(cfg.liveness.bind, "0.0.0.0:8080");
        assert!(cfg.bot_token.is_none());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut cfg = Config { bot_token: Some("SECRET_TOKEN".into()), ..Config::default() };
        cfg.provider.api_key = Some("SECRET_KEY".into());

        let debug = format!("{cfg:?}");
        assert!(!debug.contains("SECRET_TOKEN"));
        assert!(!debug.contains("SECRET_KEY"));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert!(cfg.bot_token.is_none());
        assert!(cfg.liveness.enabled);
    }
}
