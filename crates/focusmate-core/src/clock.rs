//! Clock abstraction.
//!
//! The engine never reads the system clock directly. Everything that needs
//! "now" -- the usage ledger, the rule store cache, the tracker -- takes a
//! [`Clock`], so hosts run on [`SystemClock`] while tests drive a
//! [`ManualClock`] deterministically.

use std::sync::{Mutex, PoisonError};

use chrono::{Duration, Local, NaiveDateTime};

/// Source of wall-clock time.
///
/// Daily limits and schedules follow the user's local timezone, so the
/// trait exposes both an epoch timestamp (for interval math) and a local
/// date-time (for day boundaries and weekday checks).
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64;

    /// Current date and time in the host's local timezone.
    fn local_now(&self) -> NaiveDateTime;
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests and simulations.
///
/// The epoch timestamp is derived from the held local date-time, so
/// interval math and day boundaries stay consistent as the clock advances.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.lock() = now;
    }

    pub fn advance_ms(&self, ms: u64) {
        let mut now = self.lock();
        *now += Duration::milliseconds(ms as i64);
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.lock();
        *now += Duration::days(days);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn epoch_ms(&self) -> u64 {
        self.lock().and_utc().timestamp_millis().max(0) as u64
    }

    fn local_now(&self) -> NaiveDateTime {
        *self.lock()
    }
}
