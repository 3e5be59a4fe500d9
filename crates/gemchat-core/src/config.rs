//! Configuration management for GemChat.
//!
//! Loads configuration from ${GEMCHAT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Placement preference for the model.
///
/// The model server owns actual placement; `Cpu` forces CPU via request
/// options, `Gpu` asks for full GPU offload, `Auto` defers to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Gpu,
}

impl DevicePreference {
    /// Returns the label shown in load notices and status lines.
    pub fn label(self) -> &'static str {
        match self {
            DevicePreference::Auto => "auto",
            DevicePreference::Cpu => "cpu",
            DevicePreference::Gpu => "gpu",
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model identifier on the local model server.
    pub model: String,

    /// Base URL of the Ollama-compatible model server.
    pub base_url: String,

    /// Placement preference passed through to the server.
    pub device: DevicePreference,

    /// Maximum tokens per response (server default when unset).
    pub max_tokens: Option<u32>,

    /// Optional system prompt prepended to every conversation.
    pub system_prompt: Option<String>,

    /// Rows loaded per history refresh.
    pub history_limit: usize,

    /// Timeout for a single generation request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            device: DevicePreference::Auto,
            max_tokens: None,
            system_prompt: None,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    const DEFAULT_MODEL: &str = "gemma2:2b";
    const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
    const DEFAULT_HISTORY_LIMIT: usize = 50;
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Returns the trimmed system prompt, or None when empty/unset.
    pub fn effective_system_prompt(&self) -> Option<String> {
        let trimmed = self.system_prompt.as_deref().unwrap_or("").trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Returns the commented default config template.
///
/// Embedded from default_config.toml at compile time.
pub fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for GemChat configuration and data directories.
    //!
    //! GEMCHAT_HOME resolution order:
    //! 1. GEMCHAT_HOME environment variable (if set)
    //! 2. ~/.config/gemchat (default)

    use std::path::PathBuf;

    /// Returns the user's home directory, if resolvable.
    pub fn home_dir() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
    }

    /// Returns the GemChat home directory.
    ///
    /// Checks GEMCHAT_HOME env var first, falls back to ~/.config/gemchat
    pub fn gemchat_home() -> PathBuf {
        if let Some(home) = std::env::var_os("GEMCHAT_HOME") {
            return PathBuf::from(home);
        }

        home_dir()
            .map(|h| h.join(".config").join("gemchat"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        gemchat_home().join("config.toml")
    }

    /// Returns the path to the chat database.
    pub fn db_path() -> PathBuf {
        gemchat_home().join("chat_history.db")
    }

    /// Returns the directory holding bundled data resources (stopwords etc).
    pub fn data_dir() -> PathBuf {
        gemchat_home().join("data")
    }

    /// Returns the directory for rolling log files.
    pub fn logs_dir() -> PathBuf {
        gemchat_home().join("logs")
    }

    /// Returns the path to the persisted UI session state.
    pub fn session_path() -> PathBuf {
        gemchat_home().join("session.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.model, "gemma2:2b");
        assert_eq!(config.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.device, DevicePreference::Auto);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"gemma2:9b\"\ndevice = \"cpu\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "gemma2:9b");
        assert_eq!(config.device, DevicePreference::Cpu);
        assert_eq!(config.request_timeout_secs, 120);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = 42\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(config.model, Config::default().model);
    }

    #[test]
    fn test_effective_system_prompt_trims() {
        let mut config = Config::default();
        assert_eq!(config.effective_system_prompt(), None);

        config.system_prompt = Some("  \n".to_string());
        assert_eq!(config.effective_system_prompt(), None);

        config.system_prompt = Some(" be brief ".to_string());
        assert_eq!(config.effective_system_prompt().as_deref(), Some("be brief"));
    }
}
