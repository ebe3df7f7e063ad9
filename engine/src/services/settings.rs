//! Settings service
//!
//! Persists the per-device preferences in a JSON file in the app data
//! directory.

use crate::config::SETTINGS_FILE;
use crate::error::{AppError, Result};
use crate::i18n::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Local settings that survive restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocalSettings {
    #[serde(default)]
    pub language: Language,
    /// Output language for generated reports
    #[serde(default)]
    pub ai_language: Language,
    #[serde(default)]
    pub dark_mode: bool,
    /// Printed on exported charts
    #[serde(default)]
    pub signature: String,
}

/// Service for managing local settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<LocalSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = LocalSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: LocalSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &LocalSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Load, modify and save in one step
    pub async fn update<F>(&self, change: F) -> Result<LocalSettings>
    where
        F: FnOnce(&mut LocalSettings),
    {
        let mut settings = self.load().await?;
        change(&mut settings);
        self.save(&settings).await?;
        Ok(settings)
    }
}
