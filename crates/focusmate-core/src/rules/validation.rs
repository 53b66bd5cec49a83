//! Rule validation.
//!
//! Overnight time ranges (end at or before start) are deliberately legal:
//! the schedule evaluator treats them as wrapping past midnight, so only
//! the HH:MM format is checked here.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::pattern::{self, Specifier};
use crate::schedule::minutes_of;

use super::BlockingMode;

/// Validate a rule's specifier and mode-specific fields.
pub fn validate_rule(domain: &str, mode: &BlockingMode) -> Result<(), ValidationError> {
    if domain.trim().is_empty() {
        return Err(ValidationError::MissingDomain);
    }
    if !is_valid_domain_pattern(domain.trim()) {
        return Err(ValidationError::InvalidPattern {
            pattern: domain.trim().to_string(),
        });
    }

    match mode {
        BlockingMode::Block => {}
        BlockingMode::TimeLimit { time_limit } => {
            if *time_limit == 0 {
                return Err(ValidationError::InvalidTimeLimit);
            }
        }
        BlockingMode::Schedule { schedule } => {
            if schedule.days.is_empty() {
                return Err(ValidationError::EmptyScheduleDays);
            }
            if schedule.time_ranges.is_empty() {
                return Err(ValidationError::EmptyTimeRanges);
            }
            for range in &schedule.time_ranges {
                for value in [&range.start, &range.end] {
                    if minutes_of(value).is_none() {
                        return Err(ValidationError::InvalidTimeFormat {
                            value: value.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

/// Whether a specifier string is an acceptable pattern in any of the three
/// shapes.
pub fn is_valid_domain_pattern(specifier: &str) -> bool {
    match pattern::classify(specifier) {
        Specifier::Regex { body, flags } => pattern::compile_delimited(body, flags).is_some(),
        Specifier::Subdomain(suffix) => plain_domain_re().is_match(suffix),
        Specifier::Wildcard(glob) => {
            // Allow globs over domains and paths, but nothing that could
            // not appear in a URL.
            wildcard_re().is_match(glob) && pattern::compile_wildcard(glob).is_some()
        }
        Specifier::Exact(domain) => plain_domain_re().is_match(domain),
    }
}

fn plain_domain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?$")
            .expect("hardcoded pattern compiles")
    })
}

fn wildcard_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9.*?/-]+$").expect("hardcoded pattern compiles")
    })
}
