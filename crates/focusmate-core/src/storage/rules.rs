//! Rule persistence with a short-lived read cache.
//!
//! Rules are kept in insertion order; any ranking across matching rules is
//! the decision engine's concern. Reads within the TTL are served from the
//! cache to coalesce the burst of checks a single navigation produces;
//! every write refreshes the cache synchronously so a local mutation is
//! never followed by a stale read.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::Result;
use crate::rules::{validate_rule, BlockRule, NewRule, RuleUpdate};

use super::{keys, KeyValueStore};

/// How long a cached read stays fresh.
const CACHE_TTL_MS: u64 = 5_000;

#[derive(Debug, Clone)]
struct CachedRules {
    rules: Vec<BlockRule>,
    fetched_at: u64,
}

/// CRUD over the persisted rule list.
pub struct RuleStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<CachedRules>>,
}

impl RuleStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cache: Mutex::new(None),
        }
    }

    /// All rules, in insertion order.
    pub fn all_rules(&self) -> Result<Vec<BlockRule>> {
        let now = self.clock.epoch_ms();
        {
            let cache = self.lock_cache();
            if let Some(cached) = cache.as_ref() {
                if now.saturating_sub(cached.fetched_at) <= CACHE_TTL_MS {
                    return Ok(cached.rules.clone());
                }
            }
        }

        let rules: Vec<BlockRule> = match self.store.get(keys::BLOCK_RULES)? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        debug!("rules cache refreshed ({} rules)", rules.len());
        *self.lock_cache() = Some(CachedRules {
            rules: rules.clone(),
            fetched_at: now,
        });
        Ok(rules)
    }

    /// Look up a single rule by id.
    pub fn rule(&self, id: &str) -> Result<Option<BlockRule>> {
        Ok(self.all_rules()?.into_iter().find(|rule| rule.id == id))
    }

    /// Validate and persist a new rule, assigning id and timestamps.
    pub fn add_rule(&self, new: NewRule) -> Result<BlockRule> {
        validate_rule(&new.domain, &new.mode)?;

        let now = self.clock.epoch_ms();
        let rule = BlockRule {
            id: Uuid::new_v4().to_string(),
            domain: new.domain,
            mode: new.mode,
            active: new.active,
            redirect_url: new.redirect_url,
            custom_message: new.custom_message,
            created_at: now,
            updated_at: now,
        };

        let mut rules = self.all_rules()?;
        rules.push(rule.clone());
        self.persist(rules)?;
        Ok(rule)
    }

    /// Merge a partial update into an existing rule. Returns `None` when
    /// the id is unknown; never an error.
    pub fn update_rule(&self, id: &str, update: RuleUpdate) -> Result<Option<BlockRule>> {
        let mut rules = self.all_rules()?;
        let Some(index) = rules.iter().position(|rule| rule.id == id) else {
            return Ok(None);
        };

        let mut updated = rules[index].clone();
        if let Some(domain) = update.domain {
            updated.domain = domain;
        }
        if let Some(mode) = update.mode {
            updated.mode = mode;
        }
        if let Some(active) = update.active {
            updated.active = active;
        }
        if let Some(redirect_url) = update.redirect_url {
            updated.redirect_url = Some(redirect_url);
        }
        if let Some(custom_message) = update.custom_message {
            updated.custom_message = Some(custom_message);
        }
        validate_rule(&updated.domain, &updated.mode)?;
        updated.updated_at = self.clock.epoch_ms();

        rules[index] = updated.clone();
        self.persist(rules)?;
        Ok(Some(updated))
    }

    /// Delete by id. Returns `false` when the id is unknown; deleting an
    /// already-deleted rule is a harmless no-op.
    pub fn delete_rule(&self, id: &str) -> Result<bool> {
        let mut rules = self.all_rules()?;
        let before = rules.len();
        rules.retain(|rule| rule.id != id);
        if rules.len() == before {
            return Ok(false);
        }
        self.persist(rules)?;
        Ok(true)
    }

    /// Remove every rule.
    pub fn clear_rules(&self) -> Result<()> {
        self.persist(Vec::new())
    }

    fn persist(&self, rules: Vec<BlockRule>) -> Result<()> {
        self.store
            .set(keys::BLOCK_RULES, serde_json::to_value(&rules)?)?;
        *self.lock_cache() = Some(CachedRules {
            rules,
            fetched_at: self.clock.epoch_ms(),
        });
        Ok(())
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<CachedRules>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{CoreError, ValidationError};
    use crate::rules::BlockingMode;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use serde_json::json;

    fn setup() -> (RuleStore, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        ));
        let rules = RuleStore::new(store.clone(), clock.clone());
        (rules, store, clock)
    }

    #[test]
    fn add_assigns_id_and_timestamps() {
        let (rules, _, clock) = setup();
        let added = rules
            .add_rule(NewRule::new("example.com", BlockingMode::Block))
            .unwrap();
        assert!(!added.id.is_empty());
        assert_eq!(added.created_at, clock.epoch_ms());
        assert_eq!(added.updated_at, clock.epoch_ms());
        assert!(added.active);
    }

    #[test]
    fn rules_keep_insertion_order() {
        let (rules, _, _) = setup();
        for domain in ["a.com", "b.com", "c.com"] {
            rules
                .add_rule(NewRule::new(domain, BlockingMode::Block))
                .unwrap();
        }
        let all = rules.all_rules().unwrap();
        let domains: Vec<_> = all.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(domains, vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn invalid_rule_is_rejected() {
        let (rules, _, _) = setup();
        let err = rules
            .add_rule(NewRule::new("", BlockingMode::Block))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingDomain)
        ));
        assert!(rules.all_rules().unwrap().is_empty());
    }

    #[test]
    fn update_merges_and_bumps_timestamp() {
        let (rules, _, clock) = setup();
        let added = rules
            .add_rule(NewRule::new("example.com", BlockingMode::Block))
            .unwrap();

        clock.advance_ms(1_000);
        let updated = rules
            .update_rule(
                &added.id,
                RuleUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.domain, "example.com");
        assert!(updated.updated_at > updated.created_at);
    }

    #[test]
    fn update_unknown_id_returns_none() {
        let (rules, _, _) = setup();
        let result = rules.update_rule("nope", RuleUpdate::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let (rules, _, _) = setup();
        let added = rules
            .add_rule(NewRule::new("example.com", BlockingMode::Block))
            .unwrap();

        assert!(rules.delete_rule(&added.id).unwrap());
        assert!(!rules.delete_rule(&added.id).unwrap());
        assert!(!rules.delete_rule(&added.id).unwrap());
        assert!(rules.all_rules().unwrap().is_empty());
    }

    #[test]
    fn cache_serves_reads_within_ttl() {
        let (rules, store, clock) = setup();
        rules
            .add_rule(NewRule::new("example.com", BlockingMode::Block))
            .unwrap();

        // Mutate storage behind the store's back; the cache should hide it
        // until the TTL lapses.
        store.set(keys::BLOCK_RULES, json!([])).unwrap();
        assert_eq!(rules.all_rules().unwrap().len(), 1);

        clock.advance_ms(CACHE_TTL_MS + 1);
        assert!(rules.all_rules().unwrap().is_empty());
    }

    #[test]
    fn write_refreshes_cache_synchronously() {
        let (rules, _, _) = setup();
        let added = rules
            .add_rule(NewRule::new("example.com", BlockingMode::Block))
            .unwrap();
        // Read immediately after a write observes the mutation.
        assert_eq!(rules.all_rules().unwrap().len(), 1);
        rules.delete_rule(&added.id).unwrap();
        assert!(rules.all_rules().unwrap().is_empty());
    }
}
