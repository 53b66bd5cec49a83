//! # FocusMate Core Library
//!
//! This library provides the core website-blocking logic for FocusMate.
//! It implements a host-agnostic philosophy where all decisions are made
//! by pure-ish components over two small ports ([`Clock`] and
//! [`KeyValueStore`]), with the browser adapter and the CLI being thin
//! shells over the same core library.
//!
//! ## Architecture
//!
//! - **Pattern Matcher**: Normalizes URLs to domains and matches them
//!   against exact, wildcard, subdomain and regex specifiers
//! - **Decision Engine**: Stateless policy evaluator answering "is this
//!   URL blocked right now, and why"
//! - **Tab Tracker**: Wall-clock state machine that accumulates per-domain
//!   time off host-delivered tick events
//! - **Storage**: Rule store with a short-lived read cache, a day-keyed
//!   usage ledger, and user settings, all over a JSON key-value port
//!
//! ## Key Components
//!
//! - [`DecisionEngine`]: URL evaluation against the stored rules
//! - [`TabTracker`]: Event-driven time accounting and block dispatch
//! - [`RuleStore`]: Rule CRUD with validation and a 5-second cache
//! - [`UsageLedger`]: Per-day, per-domain time accounting with daily reset

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod pattern;
pub mod rules;
pub mod schedule;
pub mod storage;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{DecisionEngine, Verdict};
pub use error::{CoreError, Result, StorageError, ValidationError};
pub use events::{Effect, TabEvent};
pub use history::{MatchLog, RuleMatch, MATCH_HISTORY_LIMIT};
pub use rules::{BlockRule, BlockingMode, NewRule, RuleUpdate};
pub use schedule::{DayOfWeek, Schedule, TimeRange};
pub use storage::{
    JsonFileStore, KeyValueStore, MemoryStore, RuleStore, Settings, SettingsStore, SettingsUpdate,
    UsageLedger,
};
pub use tracker::TabTracker;
