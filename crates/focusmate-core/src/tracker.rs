//! Tab/focus tracking state machine.
//!
//! At most one tab accumulates time at any instant, modeling exclusive
//! foreground attention. Switching tabs always flushes the outgoing tab's
//! partial interval before the new one starts, so no time is lost or
//! double-counted at a switch boundary.
//!
//! The tracker operates on wall-clock deltas and has no internal timer:
//! the host delivers [`TabEvent::Tick`] while a ticker is requested via
//! [`Effect::StartTicker`] and cancelled via [`Effect::StopTicker`].
//! A stray tick arriving after teardown is a guarded no-op.
//!
//! Storage failures during a tick are logged and swallowed; one failed
//! tick must not stop future ticks.

use std::sync::Arc;

use log::warn;

use crate::clock::Clock;
use crate::engine::DecisionEngine;
use crate::events::{Effect, TabEvent};
use crate::history::{MatchLog, RuleMatch};
use crate::pattern::extract_domain;
use crate::rules::BlockRule;
use crate::storage::UsageLedger;

/// Elapsed intervals above this are assumed to span a suspend/sleep gap.
const SUSPEND_GAP_MS: u64 = 30_000;
/// What a gapped interval counts as instead; undercounting beats
/// overcounting here.
const CLAMPED_TICK_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TrackingState {
    Idle,
    Tracking {
        tab_id: u32,
        domain: String,
        last_update_ms: u64,
    },
}

/// Drives time accounting and blocking off the host's tab events.
pub struct TabTracker {
    engine: Arc<DecisionEngine>,
    usage: Arc<UsageLedger>,
    clock: Arc<dyn Clock>,
    state: TrackingState,
    window_focused: bool,
    history: MatchLog,
}

impl TabTracker {
    pub fn new(engine: Arc<DecisionEngine>, usage: Arc<UsageLedger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine,
            usage,
            clock,
            state: TrackingState::Idle,
            window_focused: true,
            history: MatchLog::new(),
        }
    }

    /// Feed one host event through the state machine.
    pub fn handle_event(&mut self, event: TabEvent) -> Vec<Effect> {
        match event {
            TabEvent::Activated { tab_id, url } => self.switch_to(tab_id, url),
            TabEvent::UrlChanged {
                tab_id,
                url,
                active,
            } => {
                if active {
                    self.switch_to(tab_id, Some(url))
                } else {
                    Vec::new()
                }
            }
            TabEvent::WindowFocusChanged { focused } => {
                self.window_focused = focused;
                if focused {
                    // The host follows up with an Activated event for the
                    // now-active tab.
                    Vec::new()
                } else {
                    self.flush();
                    vec![Effect::StopTicker]
                }
            }
            TabEvent::Removed { tab_id } => {
                if self.tracked_tab() == Some(tab_id) {
                    self.flush();
                    vec![Effect::StopTicker]
                } else {
                    Vec::new()
                }
            }
            TabEvent::Tick => self.on_tick(),
            TabEvent::Suspend => {
                self.flush();
                vec![Effect::StopTicker]
            }
        }
    }

    /// Pre-navigation check. Main frame only; records the outcome in the
    /// match history whether or not it blocks.
    pub fn on_navigation(&mut self, tab_id: u32, url: &str, frame_id: u32) -> Option<Effect> {
        if frame_id != 0 {
            return None;
        }
        let verdict = match self.engine.evaluate(url) {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!("navigation check failed for {url}: {err}");
                return None;
            }
        };
        let rule = verdict.rule?;
        self.history.record(RuleMatch {
            url: url.to_string(),
            rule: rule.clone(),
            reason: verdict.reason.clone(),
            blocked: verdict.blocked,
            matched_at: self.clock.epoch_ms(),
        });
        verdict.blocked.then(|| Effect::BlockPage {
            tab_id,
            rule,
            reason: verdict.reason,
        })
    }

    /// Recent rule matches, newest first.
    pub fn history(&self) -> &MatchLog {
        &self.history
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackingState::Tracking { .. })
    }

    pub fn tracked_domain(&self) -> Option<&str> {
        match &self.state {
            TrackingState::Tracking { domain, .. } => Some(domain),
            TrackingState::Idle => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn switch_to(&mut self, tab_id: u32, url: Option<String>) -> Vec<Effect> {
        self.flush();

        let url = match url {
            Some(url) if is_http(&url) => url,
            _ => return vec![Effect::StopTicker],
        };
        let domain = extract_domain(&url);
        self.state = TrackingState::Tracking {
            tab_id,
            domain,
            last_update_ms: self.clock.epoch_ms(),
        };

        // Immediate check so an already-blocked page never gets a free
        // first interval.
        match self.engine.evaluate(&url) {
            Ok(verdict) if verdict.blocked => {
                self.state = TrackingState::Idle;
                match verdict.rule {
                    Some(rule) => {
                        self.record_block(&url, &rule, &verdict.reason);
                        vec![
                            Effect::BlockPage {
                                tab_id,
                                rule,
                                reason: verdict.reason,
                            },
                            Effect::StopTicker,
                        ]
                    }
                    None => vec![Effect::StopTicker],
                }
            }
            Ok(_) => vec![Effect::StartTicker],
            Err(err) => {
                warn!("initial rule check failed for {url}: {err}");
                vec![Effect::StartTicker]
            }
        }
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        // Stray ticks after teardown, and ticks while unfocused, are no-ops.
        let (tab_id, domain, last_update_ms) = match &self.state {
            TrackingState::Tracking {
                tab_id,
                domain,
                last_update_ms,
            } => (*tab_id, domain.clone(), *last_update_ms),
            TrackingState::Idle => return Vec::new(),
        };
        if !self.window_focused {
            return Vec::new();
        }

        let now = self.clock.epoch_ms();
        self.accumulate(&domain, now.saturating_sub(last_update_ms));
        self.state = TrackingState::Tracking {
            tab_id,
            domain: domain.clone(),
            last_update_ms: now,
        };

        match self.engine.evaluate(&domain) {
            Ok(verdict) if verdict.blocked => {
                // Tear tracking down once a block fires; no further time
                // accumulates after the redirect.
                self.state = TrackingState::Idle;
                match verdict.rule {
                    Some(rule) => {
                        self.record_block(&domain, &rule, &verdict.reason);
                        vec![
                            Effect::BlockPage {
                                tab_id,
                                rule,
                                reason: verdict.reason,
                            },
                            Effect::StopTicker,
                        ]
                    }
                    None => vec![Effect::StopTicker],
                }
            }
            Ok(_) => Vec::new(),
            Err(err) => {
                warn!("rule evaluation failed during tick for {domain}: {err}");
                Vec::new()
            }
        }
    }

    /// Accumulate the final interval for the tracked tab, then go idle.
    fn flush(&mut self) {
        if let TrackingState::Tracking {
            domain,
            last_update_ms,
            ..
        } = std::mem::replace(&mut self.state, TrackingState::Idle)
        {
            let elapsed = self.clock.epoch_ms().saturating_sub(last_update_ms);
            self.accumulate(&domain, elapsed);
        }
    }

    fn accumulate(&self, domain: &str, elapsed_ms: u64) {
        // A huge gap means the host was suspended between ticks; count a
        // nominal second instead of the whole gap.
        let delta = if elapsed_ms > SUSPEND_GAP_MS {
            CLAMPED_TICK_MS
        } else {
            elapsed_ms
        };
        let result = self
            .usage
            .time_spent_today(domain)
            .and_then(|spent| self.usage.set_time_spent_today(domain, spent + delta));
        if let Err(err) = result {
            warn!("failed to record time usage for {domain}: {err}");
        }
    }

    fn record_block(&mut self, url: &str, rule: &BlockRule, reason: &str) {
        self.history.record(RuleMatch {
            url: url.to_string(),
            rule: rule.clone(),
            reason: reason.to_string(),
            blocked: true,
            matched_at: self.clock.epoch_ms(),
        });
    }

    fn tracked_tab(&self) -> Option<u32> {
        match &self.state {
            TrackingState::Tracking { tab_id, .. } => Some(*tab_id),
            TrackingState::Idle => None,
        }
    }
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::engine::DecisionEngine;
    use crate::rules::{BlockingMode, NewRule};
    use crate::storage::{MemoryStore, RuleStore};
    use chrono::NaiveDate;

    struct Fixture {
        tracker: TabTracker,
        rules: Arc<RuleStore>,
        usage: Arc<UsageLedger>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        ));
        let rules = Arc::new(RuleStore::new(store.clone(), clock.clone()));
        let usage = Arc::new(UsageLedger::new(store, clock.clone()));
        let engine = Arc::new(DecisionEngine::new(
            rules.clone(),
            usage.clone(),
            clock.clone(),
        ));
        let tracker = TabTracker::new(engine, usage.clone(), clock.clone());
        Fixture {
            tracker,
            rules,
            usage,
            clock,
        }
    }

    fn activate(f: &mut Fixture, tab_id: u32, url: &str) -> Vec<Effect> {
        f.tracker.handle_event(TabEvent::Activated {
            tab_id,
            url: Some(url.to_string()),
        })
    }

    #[test]
    fn activation_starts_tracking_http_only() {
        let mut f = fixture();
        let effects = activate(&mut f, 1, "https://example.com");
        assert_eq!(effects, vec![Effect::StartTicker]);
        assert_eq!(f.tracker.tracked_domain(), Some("example.com"));

        let effects = activate(&mut f, 2, "about:blank");
        assert_eq!(effects, vec![Effect::StopTicker]);
        assert!(!f.tracker.is_tracking());
    }

    #[test]
    fn ticks_accumulate_while_focused() {
        let mut f = fixture();
        activate(&mut f, 1, "https://example.com");
        for _ in 0..3 {
            f.clock.advance_ms(1_000);
            f.tracker.handle_event(TabEvent::Tick);
        }
        assert_eq!(f.usage.time_spent_today("example.com").unwrap(), 3_000);
    }

    #[test]
    fn switching_tabs_flushes_previous_interval() {
        let mut f = fixture();
        activate(&mut f, 1, "https://first.com");
        f.clock.advance_ms(5_000);
        activate(&mut f, 2, "https://second.com");

        assert_eq!(f.usage.time_spent_today("first.com").unwrap(), 5_000);
        assert_eq!(f.tracker.tracked_domain(), Some("second.com"));
    }

    #[test]
    fn suspend_gap_is_clamped_to_one_second() {
        let mut f = fixture();
        activate(&mut f, 1, "https://example.com");
        f.clock.advance_ms(5 * 60_000); // 5 minutes of "sleep"
        f.tracker.handle_event(TabEvent::Tick);
        assert_eq!(
            f.usage.time_spent_today("example.com").unwrap(),
            CLAMPED_TICK_MS
        );
    }

    #[test]
    fn no_accumulation_while_window_unfocused() {
        let mut f = fixture();
        activate(&mut f, 1, "https://example.com");
        f.clock.advance_ms(2_000);
        let effects = f
            .tracker
            .handle_event(TabEvent::WindowFocusChanged { focused: false });
        assert_eq!(effects, vec![Effect::StopTicker]);
        // Focus loss flushed the pending 2 seconds.
        assert_eq!(f.usage.time_spent_today("example.com").unwrap(), 2_000);

        // Nothing counts while unfocused, even if a stray tick fires.
        f.clock.advance_ms(10_000);
        assert!(f.tracker.handle_event(TabEvent::Tick).is_empty());
        assert_eq!(f.usage.time_spent_today("example.com").unwrap(), 2_000);
    }

    #[test]
    fn stray_tick_after_tab_removal_is_noop() {
        let mut f = fixture();
        activate(&mut f, 1, "https://example.com");
        f.clock.advance_ms(1_000);
        let effects = f.tracker.handle_event(TabEvent::Removed { tab_id: 1 });
        assert_eq!(effects, vec![Effect::StopTicker]);
        assert_eq!(f.usage.time_spent_today("example.com").unwrap(), 1_000);

        f.clock.advance_ms(1_000);
        assert!(f.tracker.handle_event(TabEvent::Tick).is_empty());
        assert_eq!(f.usage.time_spent_today("example.com").unwrap(), 1_000);
    }

    #[test]
    fn removal_of_untracked_tab_changes_nothing() {
        let mut f = fixture();
        activate(&mut f, 1, "https://example.com");
        assert!(f
            .tracker
            .handle_event(TabEvent::Removed { tab_id: 99 })
            .is_empty());
        assert!(f.tracker.is_tracking());
    }

    #[test]
    fn always_block_rule_blocks_on_activation() {
        let mut f = fixture();
        f.rules
            .add_rule(NewRule::new("example.com", BlockingMode::Block))
            .unwrap();

        let effects = activate(&mut f, 1, "https://example.com");
        assert!(matches!(
            effects.as_slice(),
            [Effect::BlockPage { tab_id: 1, .. }, Effect::StopTicker]
        ));
        assert!(!f.tracker.is_tracking());
        assert_eq!(f.tracker.history().len(), 1);
    }

    #[test]
    fn time_limit_block_fires_mid_tick_and_tears_down() {
        let mut f = fixture();
        f.rules
            .add_rule(NewRule::new(
                "example.com",
                BlockingMode::TimeLimit { time_limit: 3_000 },
            ))
            .unwrap();
        activate(&mut f, 1, "https://example.com");

        let mut blocked_at = None;
        for tick in 1..=10 {
            f.clock.advance_ms(1_000);
            let effects = f.tracker.handle_event(TabEvent::Tick);
            if !effects.is_empty() {
                assert!(matches!(
                    effects.as_slice(),
                    [Effect::BlockPage { .. }, Effect::StopTicker]
                ));
                blocked_at = Some(tick);
                break;
            }
        }
        // 4th tick brings usage to 4000ms, strictly over the 3000ms limit.
        assert_eq!(blocked_at, Some(4));
        assert!(!f.tracker.is_tracking());

        let newest = f.tracker.history().recent().next().unwrap();
        assert!(newest.blocked);
        assert!(newest.reason.contains("Time limit"));
    }

    #[test]
    fn url_change_on_inactive_tab_is_ignored() {
        let mut f = fixture();
        activate(&mut f, 1, "https://example.com");
        let effects = f.tracker.handle_event(TabEvent::UrlChanged {
            tab_id: 2,
            url: "https://other.com".into(),
            active: false,
        });
        assert!(effects.is_empty());
        assert_eq!(f.tracker.tracked_domain(), Some("example.com"));
    }

    #[test]
    fn navigation_check_is_main_frame_only() {
        let mut f = fixture();
        f.rules
            .add_rule(NewRule::new("example.com", BlockingMode::Block))
            .unwrap();

        assert!(f
            .tracker
            .on_navigation(1, "https://example.com", 1)
            .is_none());
        assert!(f.tracker.history().is_empty());

        let effect = f.tracker.on_navigation(1, "https://example.com", 0);
        assert!(matches!(effect, Some(Effect::BlockPage { tab_id: 1, .. })));
        assert_eq!(f.tracker.history().len(), 1);
    }

    #[test]
    fn navigation_records_matched_but_not_blocking() {
        let mut f = fixture();
        f.rules
            .add_rule(NewRule::new(
                "example.com",
                BlockingMode::TimeLimit { time_limit: 60_000 },
            ))
            .unwrap();

        let effect = f.tracker.on_navigation(1, "https://example.com", 0);
        assert!(effect.is_none());
        let newest = f.tracker.history().recent().next().unwrap();
        assert!(!newest.blocked);
        assert!(newest.reason.starts_with("Under time limit"));
    }

    #[test]
    fn suspend_flushes_final_interval() {
        let mut f = fixture();
        activate(&mut f, 1, "https://example.com");
        f.clock.advance_ms(2_500);
        let effects = f.tracker.handle_event(TabEvent::Suspend);
        assert_eq!(effects, vec![Effect::StopTicker]);
        assert_eq!(f.usage.time_spent_today("example.com").unwrap(), 2_500);
        assert!(!f.tracker.is_tracking());
    }
}
