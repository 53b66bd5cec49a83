//! Recent rule-match history for the popup's diagnostics tab.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::rules::BlockRule;

/// How many matches are retained.
pub const MATCH_HISTORY_LIMIT: usize = 10;

/// One recorded rule match, blocked or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    pub url: String,
    pub rule: BlockRule,
    pub reason: String,
    pub blocked: bool,
    /// Epoch milliseconds.
    pub matched_at: u64,
}

/// In-memory ring of the most recent matches, newest first.
#[derive(Debug, Clone, Default)]
pub struct MatchLog {
    entries: VecDeque<RuleMatch>,
}

impl MatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: RuleMatch) {
        self.entries.push_front(entry);
        self.entries.truncate(MATCH_HISTORY_LIMIT);
    }

    /// Matches newest first.
    pub fn recent(&self) -> impl Iterator<Item = &RuleMatch> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::BlockingMode;

    fn entry(url: &str) -> RuleMatch {
        RuleMatch {
            url: url.to_string(),
            rule: BlockRule {
                id: "r".into(),
                domain: "example.com".into(),
                mode: BlockingMode::Block,
                active: true,
                redirect_url: None,
                custom_message: None,
                created_at: 0,
                updated_at: 0,
            },
            reason: "Always block mode".into(),
            blocked: true,
            matched_at: 0,
        }
    }

    #[test]
    fn newest_first() {
        let mut log = MatchLog::new();
        log.record(entry("https://a.com"));
        log.record(entry("https://b.com"));
        let urls: Vec<_> = log.recent().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b.com", "https://a.com"]);
    }

    #[test]
    fn capped_at_limit() {
        let mut log = MatchLog::new();
        for i in 0..15 {
            log.record(entry(&format!("https://site{i}.com")));
        }
        assert_eq!(log.len(), MATCH_HISTORY_LIMIT);
        assert_eq!(
            log.recent().next().unwrap().url,
            "https://site14.com",
            "oldest entries are evicted"
        );
    }
}
