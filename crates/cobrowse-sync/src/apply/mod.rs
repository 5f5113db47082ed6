//! Inbound envelope replay.
//!
//! Every page mutation is stamped with `Origin::Replay(envelope.id)` and,
//! when it actually changed something, arms the [`ReplayGuard`] for the
//! kind's settle time.

mod guard;

pub use guard::{GuardState, ReplayGuard, SettleTimes};

use tokio::time::Instant;
use tracing::debug;

use cobrowse_common::Role;

use crate::page::{Origin, Page};
use crate::protocol::{Envelope, SyncEvent};
use crate::selector;

/// What replaying one envelope did.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The page was mutated.
    Applied,
    /// Nothing to do: already on the path, or the selector matched nothing.
    Skipped,
    /// Remote pointer moved.
    Pointer { x: f64, y: f64 },
    /// Guest adopts the host's privacy classification.
    Privacy { is_private: bool },
    /// Not for us: a privacy toggle reaching the host, or our own role.
    Ignored,
}

pub struct Applier {
    settle: SettleTimes,
    guard: ReplayGuard,
}

impl Applier {
    pub fn new(settle: SettleTimes) -> Self {
        Self {
            settle,
            guard: ReplayGuard::new(),
        }
    }

    pub fn guard(&self) -> &ReplayGuard {
        &self.guard
    }

    pub fn guard_active(&self, now: Instant) -> bool {
        self.guard.is_active(now)
    }

    pub fn guard_deadline(&self) -> Option<Instant> {
        self.guard.deadline()
    }

    /// Drop the guard back to `Idle` if its window has closed.
    pub fn expire_guard(&mut self, now: Instant) -> bool {
        self.guard.expire(now)
    }

    pub fn reset(&mut self) {
        self.guard.clear();
    }

    /// Replay `envelope` onto `page` as `local_role`.
    pub fn apply<P: Page + ?Sized>(
        &mut self,
        envelope: &Envelope,
        local_role: Role,
        page: &mut P,
        now: Instant,
    ) -> ApplyOutcome {
        if envelope.role == local_role {
            tracing::warn!(id = %envelope.id, role = ?envelope.role, "Ignoring envelope from own role");
            return ApplyOutcome::Ignored;
        }

        let origin = Origin::Replay(envelope.id);
        let outcome = match &envelope.event {
            SyncEvent::Navigate { path } => {
                if page.current_path() == *path {
                    ApplyOutcome::Skipped
                } else {
                    self.arm(envelope, now);
                    page.navigate(path, origin);
                    ApplyOutcome::Applied
                }
            }
            SyncEvent::Click { selector, x, y } => match selector::locate(&*page, selector) {
                Some(node) => {
                    self.arm(envelope, now);
                    page.focus(node);
                    page.click(node, *x, *y, origin);
                    page.show_ripple(*x, *y);
                    ApplyOutcome::Applied
                }
                None => {
                    debug!(%selector, "Click target not found");
                    ApplyOutcome::Skipped
                }
            },
            SyncEvent::Input { selector, value } => match selector::locate(&*page, selector) {
                Some(node) => {
                    self.arm(envelope, now);
                    page.set_value(node, value, origin);
                    ApplyOutcome::Applied
                }
                None => {
                    debug!(%selector, "Input target not found");
                    ApplyOutcome::Skipped
                }
            },
            SyncEvent::Scroll { y } => {
                self.arm(envelope, now);
                page.scroll_to(*y, origin);
                ApplyOutcome::Applied
            }
            SyncEvent::CursorMove { x, y } => ApplyOutcome::Pointer { x: *x, y: *y },
            SyncEvent::PrivacyToggle { is_private } => {
                if local_role == Role::Host {
                    debug!("Host ignores privacy toggle from guest");
                    ApplyOutcome::Ignored
                } else {
                    ApplyOutcome::Privacy {
                        is_private: *is_private,
                    }
                }
            }
        };

        tracing::trace!(kind = %envelope.kind(), id = %envelope.id, ?outcome, "Applied envelope");
        outcome
    }

    /// Arm the guard before the mutation so its echo is already covered.
    fn arm(&mut self, envelope: &Envelope, now: Instant) {
        if let Some(settle) = self.settle.for_kind(envelope.kind()) {
            self.guard.enter(now + settle);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::page::{Document, InteractionKind, MemoryPage, NodeId};
    use crate::selector::Selector;

    struct Shop {
        page: MemoryPage,
        rx: tokio::sync::mpsc::UnboundedReceiver<crate::page::Interaction>,
        submit: NodeId,
        email: NodeId,
    }

    fn shop() -> Shop {
        let (page, rx) = MemoryPage::new("/products");
        let body = page.append(page.root(), "body", None);
        let form = page.append(body, "form", Some("checkout"));
        let email = page.append_input(form, None, false);
        let submit = page.append(form, "button", Some("submit-btn"));
        Shop {
            page,
            rx,
            submit,
            email,
        }
    }

    fn from_host(event: SyncEvent) -> Envelope {
        Envelope::new(Role::Host, event)
    }

    #[test]
    fn click_focuses_clicks_and_ripples() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let now = Instant::now();
        let env = from_host(SyncEvent::Click {
            selector: Selector::from("#submit-btn"),
            x: 12.0,
            y: 34.0,
        });

        assert_eq!(a.apply(&env, Role::Guest, &mut s.page, now), ApplyOutcome::Applied);
        assert_eq!(s.page.focused(), Some(s.submit));
        assert_eq!(s.page.clicks(), vec![s.submit]);
        assert_eq!(s.page.ripples(), vec![(12.0, 34.0)]);
        assert_eq!(a.guard_deadline(), Some(now + Duration::from_millis(300)));

        let echo = s.rx.try_recv().unwrap();
        assert_eq!(echo.origin, Origin::Replay(env.id));
    }

    #[test]
    fn input_sets_value_by_positional_selector() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let env = from_host(SyncEvent::Input {
            selector: Selector::from("#checkout > input:nth-child(1)"),
            value: "a@b.c".into(),
        });
        assert_eq!(
            a.apply(&env, Role::Guest, &mut s.page, Instant::now()),
            ApplyOutcome::Applied
        );
        assert_eq!(s.page.value(s.email).as_deref(), Some("a@b.c"));
    }

    #[test]
    fn missing_selector_is_a_quiet_noop() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let env = from_host(SyncEvent::Click {
            selector: Selector::from("#gone"),
            x: 0.0,
            y: 0.0,
        });
        assert_eq!(
            a.apply(&env, Role::Guest, &mut s.page, Instant::now()),
            ApplyOutcome::Skipped
        );
        assert!(s.page.clicks().is_empty());
        assert_eq!(a.guard().state(), GuardState::Idle);
    }

    #[test]
    fn navigate_only_when_path_differs() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let now = Instant::now();

        let same = from_host(SyncEvent::Navigate {
            path: "/products".into(),
        });
        assert_eq!(a.apply(&same, Role::Guest, &mut s.page, now), ApplyOutcome::Skipped);
        assert!(s.rx.try_recv().is_err());

        let cart = from_host(SyncEvent::Navigate {
            path: "/cart".into(),
        });
        assert_eq!(a.apply(&cart, Role::Guest, &mut s.page, now), ApplyOutcome::Applied);
        assert_eq!(s.page.current_path(), "/cart");
        assert_eq!(a.guard_deadline(), Some(now + Duration::from_millis(500)));
    }

    #[test]
    fn scroll_sets_offset() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let env = from_host(SyncEvent::Scroll { y: 450.0 });
        a.apply(&env, Role::Guest, &mut s.page, Instant::now());
        assert_eq!(s.page.scroll_y(), 450.0);
        assert_eq!(
            s.rx.try_recv().unwrap().kind,
            InteractionKind::Scroll { y: 450.0 }
        );
    }

    #[test]
    fn pointer_and_privacy_do_not_arm_the_guard() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let now = Instant::now();

        let pointer = from_host(SyncEvent::CursorMove { x: 5.0, y: 6.0 });
        assert_eq!(
            a.apply(&pointer, Role::Guest, &mut s.page, now),
            ApplyOutcome::Pointer { x: 5.0, y: 6.0 }
        );
        let toggle = from_host(SyncEvent::PrivacyToggle { is_private: true });
        assert_eq!(
            a.apply(&toggle, Role::Guest, &mut s.page, now),
            ApplyOutcome::Privacy { is_private: true }
        );
        assert_eq!(a.guard().state(), GuardState::Idle);
    }

    #[test]
    fn host_ignores_privacy_toggles() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let env = Envelope::new(Role::Guest, SyncEvent::PrivacyToggle { is_private: false });
        assert_eq!(
            a.apply(&env, Role::Host, &mut s.page, Instant::now()),
            ApplyOutcome::Ignored
        );
    }

    #[test]
    fn own_role_envelopes_are_ignored() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let env = from_host(SyncEvent::Scroll { y: 1.0 });
        assert_eq!(
            a.apply(&env, Role::Host, &mut s.page, Instant::now()),
            ApplyOutcome::Ignored
        );
        assert_eq!(s.page.scroll_y(), 0.0);
    }

    #[test]
    fn overlapping_replays_extend_the_guard() {
        let mut s = shop();
        let mut a = Applier::new(SettleTimes::default());
        let t0 = Instant::now();
        a.apply(
            &from_host(SyncEvent::Navigate { path: "/a".into() }),
            Role::Guest,
            &mut s.page,
            t0,
        );
        a.apply(
            &from_host(SyncEvent::Scroll { y: 1.0 }),
            Role::Guest,
            &mut s.page,
            t0 + Duration::from_millis(450),
        );
        assert_eq!(a.guard_deadline(), Some(t0 + Duration::from_millis(550)));
        assert!(!a.expire_guard(t0 + Duration::from_millis(500)));
        assert!(a.expire_guard(t0 + Duration::from_millis(550)));
    }
}
