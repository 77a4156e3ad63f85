//! Local settings for ragchat.
//!
//! Settings live in ${RAGCHAT_HOME}/settings.toml and are rewritten whole on
//! every update. Missing file means defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for the ragchat settings directory.
    //!
    //! RAGCHAT_HOME resolution order:
    //! 1. RAGCHAT_HOME environment variable (if set)
    //! 2. ~/.config/ragchat (default)

    use std::path::PathBuf;

    /// Returns the ragchat home directory.
    pub fn ragchat_home() -> PathBuf {
        if let Ok(home) = std::env::var("RAGCHAT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("ragchat"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the settings.toml file.
    pub fn settings_path() -> PathBuf {
        ragchat_home().join("settings.toml")
    }
}

/// User-facing client settings.
///
/// Mirrors the server-side user setting record; see
/// [`crate::api::user_setting`] for the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identifier sent with every request
    pub user_id: String,

    /// Display name shown in the transcript
    pub user_name: String,

    /// Stream assistant replies over SSE instead of waiting for the full body
    pub stream_mode: bool,

    /// Keep the transcript pinned to the latest message
    pub auto_scroll: bool,

    /// Show per-message timestamps in the transcript
    pub show_timestamp: bool,

    /// Backend base URL, including the /api prefix
    pub api_base_url: String,

    /// Request timeout in seconds for non-streaming calls
    pub timeout_secs: u64,
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub stream_mode: Option<bool>,
    pub auto_scroll: Option<bool>,
    pub show_timestamp: Option<bool>,
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    const DEFAULT_USER_ID: &str = "default_user";
    const DEFAULT_USER_NAME: &str = "User";
    const DEFAULT_API_BASE_URL: &str = "http://localhost:8081/api";
    const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Loads settings from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::settings_path())
    }

    /// Loads settings from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse settings from {}", path.display()))
        } else {
            Ok(Settings::default())
        }
    }

    /// Writes the full settings object to a specific path.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write settings to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Merges a partial update into this settings object.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
        if let Some(user_name) = patch.user_name {
            self.user_name = user_name;
        }
        if let Some(stream_mode) = patch.stream_mode {
            self.stream_mode = stream_mode;
        }
        if let Some(auto_scroll) = patch.auto_scroll {
            self.auto_scroll = auto_scroll;
        }
        if let Some(show_timestamp) = patch.show_timestamp {
            self.show_timestamp = show_timestamp;
        }
        if let Some(api_base_url) = patch.api_base_url {
            self.api_base_url = api_base_url;
        }
        if let Some(timeout_secs) = patch.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
    }

    /// Returns the request timeout for non-streaming calls.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_id: Self::DEFAULT_USER_ID.to_string(),
            user_name: Self::DEFAULT_USER_NAME.to_string(),
            stream_mode: true,
            auto_scroll: true,
            show_timestamp: true,
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    /// Settings loading: missing file returns defaults.
    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.toml");

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.user_id, "default_user");
        assert!(settings.stream_mode);
        assert_eq!(settings.timeout_secs, 60);
    }

    /// Settings loading: partial file merges with defaults.
    #[test]
    fn test_load_partial_settings_merges_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        fs::write(&path, "user_id = \"alice\"\nstream_mode = false\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.user_id, "alice");
        assert!(!settings.stream_mode);
        assert_eq!(settings.api_base_url, "http://localhost:8081/api"); // default preserved
    }

    /// Save then load round-trips the full object.
    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let settings = Settings {
            user_name: "Bob".to_string(),
            timeout_secs: 30,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    /// Patch merge: only named fields change.
    #[test]
    fn test_apply_patch_leaves_other_fields_unchanged() {
        let mut settings = Settings::default();
        settings.apply(SettingsPatch {
            stream_mode: Some(false),
            ..Default::default()
        });

        assert!(!settings.stream_mode);
        assert_eq!(settings.user_id, "default_user");
        assert!(settings.auto_scroll);
        assert!(settings.show_timestamp);
        assert_eq!(settings.api_base_url, "http://localhost:8081/api");
        assert_eq!(settings.timeout_secs, 60);
    }

    /// Patch merge: every field is reachable.
    #[test]
    fn test_apply_full_patch() {
        let mut settings = Settings::default();
        settings.apply(SettingsPatch {
            user_id: Some("u2".to_string()),
            user_name: Some("Carol".to_string()),
            stream_mode: Some(false),
            auto_scroll: Some(false),
            show_timestamp: Some(false),
            api_base_url: Some("http://example.com/api".to_string()),
            timeout_secs: Some(5),
        });

        assert_eq!(settings.user_id, "u2");
        assert_eq!(settings.user_name, "Carol");
        assert!(!settings.stream_mode);
        assert!(!settings.auto_scroll);
        assert!(!settings.show_timestamp);
        assert_eq!(settings.api_base_url, "http://example.com/api");
        assert_eq!(settings.timeout_secs, 5);
    }
}
