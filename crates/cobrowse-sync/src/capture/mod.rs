//! Local interaction → outbound event pipeline.
//!
//! Filters, in order:
//! 1. replayed interactions (origin marker or active guard) are ignored
//! 2. a guest on a private view sends nothing
//! 3. password field input never leaves the page
//! 4. scroll and pointer moves are coalesced per window
//! 5. clicks and input go out immediately with a resolved selector
//!
//! Route changes are special: the host reclassifies privacy on every one,
//! including navigations it made while following the guest, and announces
//! a `PRIVACY_TOGGLE` whenever the classification flips.

mod coalesce;

pub use coalesce::Coalescer;

use std::time::Duration;

use tokio::time::Instant;

use cobrowse_common::Role;

use crate::page::{Interaction, InteractionKind, Page};
use crate::privacy::PrivacyPolicy;
use crate::protocol::SyncEvent;
use crate::selector;

/// Engine state the pipeline consults for one interaction.
#[derive(Debug, Clone, Copy)]
pub struct CaptureContext {
    pub role: Role,
    /// Privacy as last announced by the host. Only meaningful for a guest.
    pub is_private: bool,
    /// The replay guard is in its settle window.
    pub guard_active: bool,
}

impl CaptureContext {
    fn guest_blocked(&self) -> bool {
        self.role == Role::Guest && self.is_private
    }
}

pub struct CapturePipeline {
    coalescer: Coalescer,
    policy: PrivacyPolicy,
    /// Host only: the classification last announced to the guest.
    host_privacy: Option<bool>,
}

impl CapturePipeline {
    pub fn new(policy: PrivacyPolicy, coalesce_window: Duration) -> Self {
        Self {
            coalescer: Coalescer::new(coalesce_window),
            policy,
            host_privacy: None,
        }
    }

    pub fn policy(&self) -> &PrivacyPolicy {
        &self.policy
    }

    /// The host's current route classification, once one has been made.
    pub fn host_privacy(&self) -> Option<bool> {
        self.host_privacy
    }

    /// Turn one local interaction into the events to broadcast right now.
    /// Coalesced kinds are held back until [`flush_due`](Self::flush_due).
    pub fn capture<P: Page + ?Sized>(
        &mut self,
        interaction: &Interaction,
        ctx: CaptureContext,
        page: &P,
        now: Instant,
    ) -> Vec<SyncEvent> {
        let mut out = Vec::new();
        let replayed = interaction.is_replay() || ctx.guard_active;

        if let InteractionKind::Navigate { path } = &interaction.kind {
            let toggle = match ctx.role {
                Role::Host => self.reclassify(path),
                Role::Guest => None,
            };
            if !replayed && !ctx.guest_blocked() {
                out.push(SyncEvent::Navigate { path: path.clone() });
            }
            if let Some(toggle) = toggle {
                push_toggle(&mut out, toggle);
            }
            return out;
        }

        if replayed {
            tracing::trace!(origin = ?interaction.origin, "Ignoring replayed interaction");
            return out;
        }
        if ctx.guest_blocked() {
            return out;
        }

        let event = match &interaction.kind {
            InteractionKind::Click { target, x, y } => SyncEvent::Click {
                selector: selector::resolve(page, *target),
                x: *x,
                y: *y,
            },
            InteractionKind::Input { target, value } => {
                if page.is_password_field(*target) {
                    tracing::trace!("Suppressing password field input");
                    return out;
                }
                SyncEvent::Input {
                    selector: selector::resolve(page, *target),
                    value: value.clone(),
                }
            }
            InteractionKind::Scroll { y } => SyncEvent::Scroll { y: *y },
            InteractionKind::PointerMove { x, y } => SyncEvent::CursorMove { x: *x, y: *y },
            InteractionKind::Navigate { .. } => return out,
        };

        out.extend(self.coalescer.offer(event, now));
        out
    }

    /// Host only: classify the starting route without announcing it.
    pub fn prime(&mut self, path: &str) -> bool {
        let is_private = self.policy.classify(path);
        self.host_privacy = Some(is_private);
        is_private
    }

    /// Host only: what a freshly attached guest needs to converge.
    pub fn announce(&mut self, path: &str) -> Vec<SyncEvent> {
        let is_private = self.policy.classify(path);
        self.host_privacy = Some(is_private);
        let mut out = vec![SyncEvent::Navigate {
            path: path.to_string(),
        }];
        push_toggle(&mut out, SyncEvent::PrivacyToggle { is_private });
        out
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.coalescer.next_deadline()
    }

    /// Release coalesced events whose window has closed. A guest that
    /// became private meanwhile drops them.
    pub fn flush_due(&mut self, ctx: CaptureContext, now: Instant) -> Vec<SyncEvent> {
        let due = self.coalescer.drain_due(now);
        if ctx.guest_blocked() {
            return Vec::new();
        }
        due
    }

    /// Forget pending events and the last classification.
    pub fn reset(&mut self) {
        self.coalescer.clear();
        self.host_privacy = None;
    }

    fn reclassify(&mut self, path: &str) -> Option<SyncEvent> {
        let is_private = self.policy.classify(path);
        if self.host_privacy == Some(is_private) {
            return None;
        }
        self.host_privacy = Some(is_private);
        tracing::debug!(path, is_private, "Route privacy changed");
        Some(SyncEvent::PrivacyToggle { is_private })
    }
}

/// A toggle into privacy goes ahead of the navigation it belongs to so the
/// guest is blocked before it lands on the private route. A toggle out of
/// privacy follows the navigation so the guest stays blocked until it has
/// left.
fn push_toggle(out: &mut Vec<SyncEvent>, toggle: SyncEvent) {
    match toggle {
        SyncEvent::PrivacyToggle { is_private: true } => out.insert(0, toggle),
        _ => out.push(toggle),
    }
}
