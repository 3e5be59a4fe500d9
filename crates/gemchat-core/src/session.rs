//! Persisted UI session state.
//!
//! Holds the values that survive across runs of the chat UI, currently just
//! the last displayed page. The page is stored as a free-form string; the
//! navigator owns parsing it and falls back to the default page when the
//! value is unrecognized.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Name of the default page, used when no session file exists yet.
pub const DEFAULT_PAGE: &str = "chat";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    /// Last displayed page, by name.
    pub page: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE.to_string(),
        }
    }
}

impl SessionState {
    /// Loads the session from the default path.
    ///
    /// A missing or unreadable session file is a recoverable local condition:
    /// it yields the default state, never an error.
    pub fn load() -> Self {
        Self::load_from(&paths::session_path())
    }

    /// Loads the session from a specific path, defaulting on any failure.
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_default()
    }

    /// Saves the session to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&paths::session_path())
    }

    /// Saves the session to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string(self).context("Failed to serialize session state")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write session to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_defaults_to_chat() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionState::load_from(&dir.path().join("session.toml"));
        assert_eq!(session.page, "chat");
    }

    #[test]
    fn test_corrupt_file_defaults_to_chat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "page = [not toml").unwrap();

        let session = SessionState::load_from(&path);
        assert_eq!(session.page, "chat");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");

        let session = SessionState {
            page: "history".to_string(),
        };
        session.save_to(&path).unwrap();

        let loaded = SessionState::load_from(&path);
        assert_eq!(loaded.page, "history");
    }

    #[test]
    fn test_unknown_page_string_is_preserved() {
        // Coercion to a valid page is the navigator's job, not storage's.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "page = \"dashboard\"\n").unwrap();

        let session = SessionState::load_from(&path);
        assert_eq!(session.page, "dashboard");
    }
}
