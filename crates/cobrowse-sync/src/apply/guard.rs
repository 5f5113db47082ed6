//! Timed re-entrancy guard.
//!
//! Replaying a page-mutating event makes the page echo it back as an
//! interaction. The origin marker catches that echo directly; this guard
//! is the fallback for echoes that lose the marker. While `Applying`,
//! capture treats every interaction as replayed.

use std::time::Duration;

use tokio::time::Instant;

use crate::protocol::EventKind;

/// How long after a replay its echoes may still arrive, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTimes {
    pub input: Duration,
    pub scroll: Duration,
    pub click: Duration,
    pub navigate: Duration,
}

impl Default for SettleTimes {
    fn default() -> Self {
        Self {
            input: Duration::from_millis(100),
            scroll: Duration::from_millis(100),
            click: Duration::from_millis(300),
            navigate: Duration::from_millis(500),
        }
    }
}

impl SettleTimes {
    /// `None` for kinds that never mutate the page.
    pub fn for_kind(&self, kind: EventKind) -> Option<Duration> {
        match kind {
            EventKind::Input => Some(self.input),
            EventKind::Scroll => Some(self.scroll),
            EventKind::Click => Some(self.click),
            EventKind::Navigate => Some(self.navigate),
            EventKind::CursorMove | EventKind::PrivacyToggle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardState {
    #[default]
    Idle,
    Applying {
        until: Instant,
    },
}

#[derive(Debug, Default)]
pub struct ReplayGuard {
    state: GuardState,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Enter or extend the settle window. The later deadline wins.
    pub fn enter(&mut self, until: Instant) {
        self.state = match self.state {
            GuardState::Applying { until: current } if current >= until => return,
            _ => GuardState::Applying { until },
        };
    }

    pub fn is_active(&self, now: Instant) -> bool {
        matches!(self.state, GuardState::Applying { until } if now < until)
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            GuardState::Idle => None,
            GuardState::Applying { until } => Some(until),
        }
    }

    /// Return to `Idle` once the deadline has passed. True on transition.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.state {
            GuardState::Applying { until } if now >= until => {
                self.state = GuardState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.state = GuardState::Idle;
    }
}
