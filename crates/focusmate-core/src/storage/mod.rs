//! Persistence: the key-value port and the stores built on top of it.
//!
//! The host environment owns the real storage (the browser's extension
//! storage area); the engine only sees [`KeyValueStore`]. [`MemoryStore`]
//! backs tests, [`JsonFileStore`] backs standalone hosts like the CLI.

mod json_file;
mod memory;
mod rules;
mod settings;
mod usage;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use rules::RuleStore;
pub use settings::{Settings, SettingsStore, SettingsUpdate};
pub use usage::UsageLedger;

use std::path::PathBuf;

use serde_json::Value;

use crate::error::StorageError;

/// Per-user data directory for standalone hosts.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSMATE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusmate-dev")
    } else {
        base_dir.join("focusmate")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Logical storage keys. Kept camelCase so data exported from the
/// browser extension loads unchanged.
pub mod keys {
    pub const BLOCK_RULES: &str = "blockRules";
    pub const TIME_USAGE: &str = "timeUsage";
    pub const LAST_RESET: &str = "lastReset";
    pub const SETTINGS: &str = "settings";
}

/// Asynchronous-storage port, flattened to synchronous calls.
///
/// Implementations must be safe to call from interleaved event handlers;
/// every method is a single read or a single write, never a
/// read-modify-write the store itself has to make atomic.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// Drop every key. Used by "reset all data".
    fn clear(&self) -> Result<(), StorageError>;
}
