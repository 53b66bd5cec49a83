//! Events in from the host, effects out to the host.
//!
//! The browser adapter translates its native callbacks (tab activation,
//! navigation, window focus, alarms) into [`TabEvent`]s and executes the
//! [`Effect`]s the tracker hands back. Keeping both as plain data keeps
//! the engine testable without a browser.

use serde::{Deserialize, Serialize};

use crate::rules::BlockRule;

/// Browser-side happenings the tracker reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabEvent {
    /// A tab became the active tab. `url` is the tab's current URL when
    /// the host knows it.
    Activated { tab_id: u32, url: Option<String> },
    /// The URL of a tab changed. `active` mirrors whether that tab is the
    /// currently focused one.
    UrlChanged {
        tab_id: u32,
        url: String,
        active: bool,
    },
    /// The browser window gained or lost focus.
    WindowFocusChanged { focused: bool },
    /// A tab was closed.
    Removed { tab_id: u32 },
    /// Periodic accumulation tick, roughly one per second.
    Tick,
    /// The extension is about to be suspended; last chance to flush.
    Suspend,
}

/// Side effects for the host to carry out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Show the block overlay (or navigate to the rule's redirect URL)
    /// for the given tab.
    BlockPage {
        tab_id: u32,
        rule: BlockRule,
        reason: String,
    },
    /// Start delivering periodic `Tick` events.
    StartTicker,
    /// Stop delivering `Tick` events.
    StopTicker,
}
