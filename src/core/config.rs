//! User preferences stored in `settings/user_preferences.json`

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Error, Result};
use super::file_system;

/// User preferences, one section per settings tab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub appearance: AppearancePrefs,
    pub writing: WritingPrefs,
    pub export: ExportPrefs,
    pub ai_assistance: AiPrefs,
    pub backup: BackupPrefs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearancePrefs {
    /// light, dark or system
    pub theme: String,
    pub font_size: u32,
    pub font_family: String,
    /// compact, normal or comfortable
    pub density: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WritingPrefs {
    pub auto_save: bool,
    /// Seconds between auto-saves
    pub auto_save_interval: u64,
    pub spell_check: bool,
    pub grammar_check: bool,
    pub word_count_goal: u64,
    pub daily_word_goal: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportPrefs {
    pub default_format: String,
    pub include_metadata: bool,
    pub page_size: String,
    pub font_size_export: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiPrefs {
    pub enabled: bool,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupPrefs {
    pub auto_backup: bool,
    /// Seconds between scheduled backups
    pub backup_interval: u64,
    pub keep_backups: usize,
    pub cloud_backup: bool,
}

impl Default for AppearancePrefs {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            font_size: 14,
            font_family: "Arial".to_string(),
            density: "normal".to_string(),
        }
    }
}

impl Default for WritingPrefs {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_interval: 30,
            spell_check: true,
            grammar_check: false,
            word_count_goal: 1000,
            daily_word_goal: 1000,
        }
    }
}

impl Default for ExportPrefs {
    fn default() -> Self {
        Self {
            default_format: "pdf".to_string(),
            include_metadata: true,
            page_size: "A4".to_string(),
            font_size_export: 12,
        }
    }
}

impl Default for AiPrefs {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

impl Default for BackupPrefs {
    fn default() -> Self {
        Self {
            auto_backup: true,
            backup_interval: 3600,
            keep_backups: 10,
            cloud_backup: false,
        }
    }
}

/// Parse one section, falling back to its defaults when absent or malformed
fn section<T: DeserializeOwned + Default>(root: &Value, name: &str) -> T {
    match root.get(name) {
        None => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed '{}' preferences: {}", name, e);
            T::default()
        }),
    }
}

impl Preferences {
    /// Load preferences; a missing or unreadable file yields the defaults
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        let root: Value = match serde_json::from_str(&content) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Preferences at {} are corrupt: {}", path.display(), e);
                return Self::default();
            }
        };

        Self {
            appearance: section(&root, "appearance"),
            writing: section(&root, "writing"),
            export: section(&root, "export"),
            ai_assistance: section(&root, "ai_assistance"),
            backup: section(&root, "backup"),
        }
    }

    /// Save preferences to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec_pretty(self).map_err(|e| Error::format(path, e))?;
        file_system::atomic_write(path, &content).map_err(|e| Error::io("write", path, e))?;

        tracing::info!("Saved preferences to: {}", path.display());
        Ok(())
    }

    /// Overwrite the stored preferences with the built-in defaults
    pub fn reset(path: &Path) -> Result<Self> {
        let defaults = Self::default();
        defaults.save(path)?;
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::load(&dir.path().join("user_preferences.json"));
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.writing.auto_save_interval, 30);
        assert_eq!(prefs.backup.keep_backups, 10);
    }

    #[test]
    fn test_sections_default_independently() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_preferences.json");
        std::fs::write(
            &path,
            r#"{
  "appearance": {"theme": "dark"},
  "writing": "not an object",
  "backup": {"keep_backups": 3}
}"#,
        )
        .unwrap();

        let prefs = Preferences::load(&path);
        assert_eq!(prefs.appearance.theme, "dark");
        assert_eq!(prefs.appearance.font_size, 14);
        assert_eq!(prefs.writing, WritingPrefs::default());
        assert_eq!(prefs.backup.keep_backups, 3);
        assert!(prefs.backup.auto_backup);
        assert_eq!(prefs.export, ExportPrefs::default());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_preferences.json");
        std::fs::write(&path, "{ corrupt").unwrap();
        assert_eq!(Preferences::load(&path), Preferences::default());
    }

    #[test]
    fn test_save_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings").join("user_preferences.json");
        let mut prefs = Preferences::default();
        prefs.writing.auto_save = false;
        prefs.save(&path).unwrap();
        assert!(!Preferences::load(&path).writing.auto_save);

        Preferences::reset(&path).unwrap();
        assert!(Preferences::load(&path).writing.auto_save);
    }
}
