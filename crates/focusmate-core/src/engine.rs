//! Blocking decision engine.
//!
//! Stateless policy evaluator: all state lives in the rule store and the
//! usage ledger. Given a URL it answers "is this blocked right now, and
//! why" by matching the normalized candidate against every active rule and
//! dispatching on the rule's mode.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::Clock;
use crate::error::Result;
use crate::pattern::{self, extract_domain};
use crate::rules::{BlockRule, BlockingMode};
use crate::storage::{RuleStore, UsageLedger};

/// Outcome of a single evaluation.
///
/// `rule` can be set while `blocked` is false: the rule matched the URL
/// but does not currently block it (under its time limit, outside its
/// schedule). That is distinct from no rule matching at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub blocked: bool,
    pub rule: Option<BlockRule>,
    pub reason: String,
}

impl Verdict {
    fn no_match() -> Self {
        Self {
            blocked: false,
            rule: None,
            reason: "No matching rule".to_string(),
        }
    }
}

/// Evaluates URLs against the stored rules.
pub struct DecisionEngine {
    rules: Arc<RuleStore>,
    usage: Arc<UsageLedger>,
    clock: Arc<dyn Clock>,
}

impl DecisionEngine {
    pub fn new(rules: Arc<RuleStore>, usage: Arc<UsageLedger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            rules,
            usage,
            clock,
        }
    }

    /// Decide whether `url` should be blocked right now.
    ///
    /// Rules are visited in store order; the first rule that evaluates to
    /// blocked wins. A malformed specifier simply never matches, so the
    /// remaining rules still get their turn. When nothing blocks, the
    /// first matched-but-idle rule (if any) is reported for diagnostics.
    pub fn evaluate(&self, url: &str) -> Result<Verdict> {
        let domain = extract_domain(url);
        let rules = self.rules.all_rules()?;

        let mut matched_idle: Option<Verdict> = None;
        for rule in rules {
            if !rule.active || !pattern::matches(url, &rule.domain) {
                continue;
            }

            match &rule.mode {
                BlockingMode::Block => {
                    return Ok(Verdict {
                        blocked: true,
                        rule: Some(rule),
                        reason: "Always block mode".to_string(),
                    });
                }
                BlockingMode::TimeLimit { time_limit } => {
                    let spent = self.usage.time_spent_today(&domain)?;
                    // Strictly greater: exactly at the limit is still allowed.
                    if spent > *time_limit {
                        let reason = format!("Time limit ({} min) exceeded", time_limit / 60_000);
                        return Ok(Verdict {
                            blocked: true,
                            rule: Some(rule),
                            reason,
                        });
                    }
                    if matched_idle.is_none() {
                        matched_idle = Some(Verdict {
                            blocked: false,
                            reason: format!(
                                "Under time limit ({}/{} sec)",
                                spent / 1_000,
                                time_limit / 1_000
                            ),
                            rule: Some(rule),
                        });
                    }
                }
                BlockingMode::Schedule { schedule } => {
                    if schedule.is_within(self.clock.local_now()) {
                        return Ok(Verdict {
                            blocked: true,
                            rule: Some(rule),
                            reason: "Within scheduled block time".to_string(),
                        });
                    }
                    if matched_idle.is_none() {
                        matched_idle = Some(Verdict {
                            blocked: false,
                            rule: Some(rule),
                            reason: "Outside scheduled block time".to_string(),
                        });
                    }
                }
            }
        }

        Ok(matched_idle.unwrap_or_else(Verdict::no_match))
    }
}
