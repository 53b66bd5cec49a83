//! Per-domain, per-day foreground time accounting.
//!
//! The ledger stores absolute accumulated milliseconds keyed by local
//! calendar day, then by normalized domain. Callers compute their own
//! elapsed delta (from their own last-seen timestamp) and write the new
//! absolute total; the ledger never adds on their behalf, which keeps
//! interleaved ticks from double-counting.
//!
//! Only today's entries matter: the day map is purged down to today
//! whenever a write notices the local date changed, and on explicit
//! cleanup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use log::debug;
use serde_json::json;

use crate::clock::Clock;
use crate::error::Result;
use crate::pattern::extract_domain;
use crate::schedule::minutes_of;

use super::{keys, KeyValueStore};

/// Day-keyed usage map: "YYYY-MM-DD" -> domain -> accumulated ms.
type UsageMap = HashMap<String, HashMap<String, u64>>;

/// Persistent time-usage ledger.
pub struct UsageLedger {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    /// Remembered local date, for new-day detection between writes.
    current_day: Mutex<Option<String>>,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            current_day: Mutex::new(None),
        }
    }

    /// Milliseconds accumulated for `domain` today; 0 when nothing has
    /// been recorded yet.
    pub fn time_spent_today(&self, domain: &str) -> Result<u64> {
        let domain = extract_domain(domain);
        let usage = self.load()?;
        Ok(usage
            .get(&self.today())
            .and_then(|day| day.get(&domain))
            .copied()
            .unwrap_or(0))
    }

    /// Set today's absolute accumulated value for `domain`.
    pub fn set_time_spent_today(&self, domain: &str, total_ms: u64) -> Result<()> {
        let domain = extract_domain(domain);
        let mut usage = self.load()?;
        let today = self.today();
        self.rollover(&mut usage, &today);
        usage.entry(today).or_default().insert(domain, total_ms);
        self.save(&usage)
    }

    /// Today's domain -> ms map, for the statistics UI.
    pub fn all_usage_today(&self) -> Result<HashMap<String, u64>> {
        let usage = self.load()?;
        Ok(usage.get(&self.today()).cloned().unwrap_or_default())
    }

    /// Purge every day except today. Safe to call from a periodic timer.
    pub fn cleanup_old_usage(&self) -> Result<()> {
        let mut usage = self.load()?;
        let today = self.today();
        let before = usage.len();
        self.rollover(&mut usage, &today);
        if usage.len() != before {
            self.save(&usage)?;
        }
        Ok(())
    }

    /// Drop all usage data and record when the reset happened.
    pub fn reset_usage(&self) -> Result<()> {
        self.store.set(keys::TIME_USAGE, json!({}))?;
        self.store
            .set(keys::LAST_RESET, json!(self.clock.epoch_ms()))?;
        Ok(())
    }

    /// Epoch ms of the last reset; 0 when never reset.
    pub fn last_reset(&self) -> Result<u64> {
        Ok(self
            .store
            .get(keys::LAST_RESET)?
            .and_then(|value| value.as_u64())
            .unwrap_or(0))
    }

    /// Reset when the last reset predates the most recent occurrence of
    /// the configured daily reset time ("HH:MM"). Returns whether a reset
    /// ran. Called by hosts at startup.
    pub fn run_daily_reset_if_due(&self, reset_time: &str) -> Result<bool> {
        let reset_minutes = minutes_of(reset_time).unwrap_or(0);
        let now = self.clock.local_now();
        let now_minutes = {
            use chrono::Timelike;
            now.hour() * 60 + now.minute()
        };

        // Most recent boundary: today's reset time, or yesterday's when it
        // hasn't happened yet today. Expressed as an offset from "now" so
        // epoch comparison stays timezone-agnostic.
        let mut since_boundary = Duration::minutes(now_minutes as i64 - reset_minutes as i64);
        if now_minutes < reset_minutes {
            since_boundary += Duration::days(1);
        }
        let boundary_epoch = self
            .clock
            .epoch_ms()
            .saturating_sub(since_boundary.num_milliseconds().max(0) as u64);

        let last = self.last_reset()?;
        if last < boundary_epoch {
            self.reset_usage()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn today(&self) -> String {
        self.clock.local_now().date().format("%Y-%m-%d").to_string()
    }

    /// Retain only today's entries once the remembered date goes stale.
    fn rollover(&self, usage: &mut UsageMap, today: &str) {
        let mut remembered = self.lock_day();
        let changed = remembered.as_deref() != Some(today);
        if changed {
            debug!("usage ledger day rollover to {today}");
            *remembered = Some(today.to_string());
        }
        if changed || usage.keys().any(|day| day != today) {
            usage.retain(|day, _| day == today);
        }
    }

    fn load(&self) -> Result<UsageMap> {
        match self.store.get(keys::TIME_USAGE)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(UsageMap::new()),
        }
    }

    fn save(&self, usage: &UsageMap) -> Result<()> {
        self.store
            .set(keys::TIME_USAGE, serde_json::to_value(usage)?)?;
        Ok(())
    }

    fn lock_day(&self) -> MutexGuard<'_, Option<String>> {
        self.current_day
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn setup() -> (UsageLedger, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        ));
        (UsageLedger::new(store, clock.clone()), clock)
    }

    #[test]
    fn absent_domain_reads_zero() {
        let (ledger, _) = setup();
        assert_eq!(ledger.time_spent_today("example.com").unwrap(), 0);
    }

    #[test]
    fn set_then_read_back() {
        let (ledger, _) = setup();
        ledger.set_time_spent_today("example.com", 1_500).unwrap();
        assert_eq!(ledger.time_spent_today("example.com").unwrap(), 1_500);
        // Absolute set, not additive.
        ledger.set_time_spent_today("example.com", 2_000).unwrap();
        assert_eq!(ledger.time_spent_today("example.com").unwrap(), 2_000);
    }

    #[test]
    fn domain_is_normalized_on_both_paths() {
        let (ledger, _) = setup();
        ledger
            .set_time_spent_today("https://www.example.com/page", 900)
            .unwrap();
        assert_eq!(ledger.time_spent_today("example.com").unwrap(), 900);
    }

    #[test]
    fn day_isolation() {
        let (ledger, clock) = setup();
        ledger.set_time_spent_today("example.com", 90_000).unwrap();

        clock.advance_days(1);
        ledger.cleanup_old_usage().unwrap();
        assert_eq!(ledger.time_spent_today("example.com").unwrap(), 0);
    }

    #[test]
    fn write_after_day_change_purges_yesterday() {
        let (ledger, clock) = setup();
        ledger.set_time_spent_today("old.com", 50_000).unwrap();

        clock.advance_days(1);
        ledger.set_time_spent_today("new.com", 1_000).unwrap();

        assert_eq!(ledger.time_spent_today("new.com").unwrap(), 1_000);
        assert_eq!(ledger.time_spent_today("old.com").unwrap(), 0);
        assert_eq!(ledger.all_usage_today().unwrap().len(), 1);
    }

    #[test]
    fn reset_clears_usage_and_records_time() {
        let (ledger, clock) = setup();
        ledger.set_time_spent_today("example.com", 5_000).unwrap();

        ledger.reset_usage().unwrap();
        assert_eq!(ledger.time_spent_today("example.com").unwrap(), 0);
        assert_eq!(ledger.last_reset().unwrap(), clock.epoch_ms());
    }

    #[test]
    fn daily_reset_runs_once_per_boundary() {
        let (ledger, clock) = setup();
        ledger.set_time_spent_today("example.com", 5_000).unwrap();

        // Never reset before: due immediately.
        assert!(ledger.run_daily_reset_if_due("00:00").unwrap());
        assert_eq!(ledger.time_spent_today("example.com").unwrap(), 0);

        // Same day, same boundary: not due again.
        clock.advance_ms(60_000);
        assert!(!ledger.run_daily_reset_if_due("00:00").unwrap());

        // Next day past the boundary: due again.
        clock.advance_days(1);
        assert!(ledger.run_daily_reset_if_due("00:00").unwrap());
    }

    #[test]
    fn daily_reset_respects_custom_reset_time() {
        let (ledger, clock) = setup();
        ledger.reset_usage().unwrap();

        // Clock is at 12:00; a 14:00 boundary has not passed yet today.
        assert!(!ledger.run_daily_reset_if_due("14:00").unwrap());

        clock.advance_ms(3 * 60 * 60 * 1_000); // 15:00
        assert!(ledger.run_daily_reset_if_due("14:00").unwrap());
    }
}
