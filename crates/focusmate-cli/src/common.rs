//! Store wiring shared by the CLI commands.

use std::sync::Arc;

use focusmate_core::storage::data_dir;
use focusmate_core::{
    Clock, DecisionEngine, JsonFileStore, RuleStore, SettingsStore, SystemClock, UsageLedger,
};

const STORAGE_FILE: &str = "storage.json";

/// All the stores, opened over one on-disk JSON document.
pub struct Context {
    pub rules: Arc<RuleStore>,
    pub usage: Arc<UsageLedger>,
    pub settings: SettingsStore,
    pub engine: DecisionEngine,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let store: Arc<JsonFileStore> = Arc::new(JsonFileStore::new(data_dir()?.join(STORAGE_FILE)));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let rules = Arc::new(RuleStore::new(store.clone(), clock.clone()));
        let usage = Arc::new(UsageLedger::new(store.clone(), clock.clone()));
        let settings = SettingsStore::new(store);
        let engine = DecisionEngine::new(rules.clone(), usage.clone(), clock);
        Ok(Self {
            rules,
            usage,
            settings,
            engine,
        })
    }
}
