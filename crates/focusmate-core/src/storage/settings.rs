//! Extension-wide settings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{keys, KeyValueStore};

/// User settings, persisted under their own key with sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enable_notifications: bool,
    pub dark_mode: bool,
    /// Daily statistics reset time, "HH:MM".
    pub reset_time: String,
    pub default_block_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_notifications: true,
            dark_mode: false,
            reset_time: "00:00".to_string(),
            default_block_message:
                "This website is blocked by FocusMate to help you stay focused.".to_string(),
        }
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub enable_notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub reset_time: Option<String>,
    pub default_block_message: Option<String>,
}

/// Read/merge access to the persisted [`Settings`].
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current settings; defaults when none have been saved yet.
    pub fn get(&self) -> Result<Settings> {
        match self.store.get(keys::SETTINGS)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Settings::default()),
        }
    }

    /// Merge a partial update and persist the result.
    pub fn update(&self, update: SettingsUpdate) -> Result<Settings> {
        let mut settings = self.get()?;
        if let Some(enable_notifications) = update.enable_notifications {
            settings.enable_notifications = enable_notifications;
        }
        if let Some(dark_mode) = update.dark_mode {
            settings.dark_mode = dark_mode;
        }
        if let Some(reset_time) = update.reset_time {
            settings.reset_time = reset_time;
        }
        if let Some(default_block_message) = update.default_block_message {
            settings.default_block_message = default_block_message;
        }
        self.store
            .set(keys::SETTINGS, serde_json::to_value(&settings)?)?;
        Ok(settings)
    }
}
