//! User-authored blocking rules.
//!
//! A rule carries exactly the fields its mode needs: the mode is a tagged
//! union, so a schedule rule cannot carry a time limit and vice versa.
//! Serialized JSON uses camelCase field names and lowercase mode tags to
//! match the browser extension's storage format.

mod validation;

pub use validation::{is_valid_domain_pattern, validate_rule};

use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

/// What a rule does once its specifier matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BlockingMode {
    /// Block on every match.
    Block,
    /// Block once today's accumulated time exceeds the budget.
    TimeLimit {
        /// Daily budget in milliseconds.
        #[serde(rename = "timeLimit")]
        time_limit: u64,
    },
    /// Block while the current local time falls inside the schedule.
    Schedule { schedule: Schedule },
}

/// A persisted blocking rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRule {
    /// Opaque unique id, assigned at creation, immutable.
    pub id: String,
    /// Site specifier: plain domain, wildcard, or `/regex/flags`.
    pub domain: String,
    #[serde(flatten)]
    pub mode: BlockingMode,
    /// Inactive rules are never matched.
    pub active: bool,
    /// Where to send the tab instead of the default block screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Message shown on the block overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    /// Epoch milliseconds, set by the store.
    pub created_at: u64,
    /// Epoch milliseconds, bumped by the store on every update.
    pub updated_at: u64,
}

impl BlockRule {
    /// Daily budget in milliseconds, when this is a time-limit rule.
    pub fn time_limit(&self) -> Option<u64> {
        match &self.mode {
            BlockingMode::TimeLimit { time_limit } => Some(*time_limit),
            _ => None,
        }
    }

    /// The schedule, when this is a schedule rule.
    pub fn schedule(&self) -> Option<&Schedule> {
        match &self.mode {
            BlockingMode::Schedule { schedule } => Some(schedule),
            _ => None,
        }
    }
}

/// Fields a caller supplies to create a rule; id and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub domain: String,
    #[serde(flatten)]
    pub mode: BlockingMode,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

impl NewRule {
    pub fn new(domain: impl Into<String>, mode: BlockingMode) -> Self {
        Self {
            domain: domain.into(),
            mode,
            active: true,
            redirect_url: None,
            custom_message: None,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Partial update applied to an existing rule; absent fields are left
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    pub domain: Option<String>,
    #[serde(flatten)]
    pub mode: Option<BlockingMode>,
    pub active: Option<bool>,
    pub redirect_url: Option<String>,
    pub custom_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{DayOfWeek, TimeRange};

    #[test]
    fn rule_json_round_trips_original_format() {
        let rule = BlockRule {
            id: "abc".into(),
            domain: "example.com".into(),
            mode: BlockingMode::TimeLimit { time_limit: 60_000 },
            active: true,
            redirect_url: None,
            custom_message: Some("take a break".into()),
            created_at: 1,
            updated_at: 2,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["mode"], "time_limit");
        assert_eq!(json["timeLimit"], 60_000);
        assert_eq!(json["customMessage"], "take a break");
        assert_eq!(json["createdAt"], 1);
        assert!(json.get("schedule").is_none());

        let back: BlockRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn schedule_rule_carries_only_schedule_fields() {
        let rule = BlockRule {
            id: "abc".into(),
            domain: "example.com".into(),
            mode: BlockingMode::Schedule {
                schedule: crate::schedule::Schedule {
                    days: vec![DayOfWeek::Friday],
                    time_ranges: vec![TimeRange {
                        start: "20:00".into(),
                        end: "23:00".into(),
                    }],
                },
            },
            active: true,
            redirect_url: None,
            custom_message: None,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["mode"], "schedule");
        assert!(json.get("timeLimit").is_none());
        assert_eq!(json["schedule"]["days"][0], "friday");
        assert!(rule.time_limit().is_none());
        assert!(rule.schedule().is_some());
    }
}
