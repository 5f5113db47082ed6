//! Trailing-edge coalescing for high-frequency events.
//!
//! The first event of a kind arms a deadline one window out. Later events
//! of that kind overwrite the pending value without moving the deadline.
//! When the deadline passes exactly one event, the latest, is released.

use std::time::Duration;

use tokio::time::Instant;

use crate::protocol::SyncEvent;

struct Pending {
    event: SyncEvent,
    deadline: Instant,
}

/// One pending slot per coalesced kind (scroll and pointer).
pub struct Coalescer {
    window: Duration,
    scroll: Option<Pending>,
    pointer: Option<Pending>,
}

impl Coalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            scroll: None,
            pointer: None,
        }
    }

    /// Offer an event. Returns it back unchanged if its kind is not
    /// coalesced.
    pub fn offer(&mut self, event: SyncEvent, now: Instant) -> Option<SyncEvent> {
        let slot = match event {
            SyncEvent::Scroll { .. } => &mut self.scroll,
            SyncEvent::CursorMove { .. } => &mut self.pointer,
            other => return Some(other),
        };
        if let Some(pending) = slot.as_mut() {
            pending.event = event;
        } else {
            *slot = Some(Pending {
                event,
                deadline: now + self.window,
            });
        }
        None
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [&self.scroll, &self.pointer]
            .into_iter()
            .flatten()
            .map(|p| p.deadline)
            .min()
    }

    /// Release every slot whose window has closed, earliest first.
    pub fn drain_due(&mut self, now: Instant) -> Vec<SyncEvent> {
        let mut due: Vec<Pending> = [&mut self.scroll, &mut self.pointer]
            .into_iter()
            .filter_map(|slot| {
                if slot.as_ref().is_some_and(|p| p.deadline <= now) {
                    slot.take()
                } else {
                    None
                }
            })
            .collect();
        due.sort_by_key(|p| p.deadline);
        due.into_iter().map(|p| p.event).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scroll.is_none() && self.pointer.is_none()
    }

    pub fn clear(&mut self) {
        self.scroll = None;
        self.pointer = None;
    }
}
