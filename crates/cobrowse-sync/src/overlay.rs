//! Presence view model.
//!
//! Pure function of session, privacy and the last remote pointer. The
//! engine republishes the view after every change; a UI only renders it.

use cobrowse_common::{Role, SessionId};

use crate::privacy::PrivacyState;
use crate::session::{ConnectionStatus, SessionSnapshot};

/// Last pointer position received from the peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemotePointer {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Join,
    Leave,
}

/// Floating indicator for the other party's pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerDot {
    pub x: f64,
    pub y: f64,
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    pub status: ConnectionStatus,
    pub session_id: Option<SessionId>,
    /// What the copy affordance puts on the clipboard.
    pub copy_text: Option<String>,
    pub controls: Vec<Control>,
    pub pointer: Option<PointerDot>,
    /// Full-screen blocking surface, shown to a guest on a private view.
    pub blocking: bool,
}

impl Default for OverlayView {
    fn default() -> Self {
        OverlayState::default().view()
    }
}

fn role_color(role: Role) -> &'static str {
    match role {
        Role::Host => "#3b82f6",
        Role::Guest => "#22c55e",
    }
}

/// Inputs of the overlay, owned by the engine.
#[derive(Debug, Clone, Default)]
pub struct OverlayState {
    pub session: SessionSnapshot,
    pub pointer: Option<RemotePointer>,
    pub privacy: PrivacyState,
}

impl OverlayState {
    pub fn view(&self) -> OverlayView {
        let controls = match self.session.status {
            ConnectionStatus::Idle | ConnectionStatus::Error => vec![Control::Start, Control::Join],
            ConnectionStatus::Connecting | ConnectionStatus::Connected => vec![Control::Leave],
        };

        let pointer = match (self.session.role, self.pointer) {
            (Some(role), Some(p)) if !self.privacy.is_private => {
                let remote = role.peer();
                Some(PointerDot {
                    x: p.x,
                    y: p.y,
                    label: remote.label(),
                    color: role_color(remote),
                })
            }
            _ => None,
        };

        OverlayView {
            status: self.session.status,
            session_id: self.session.id.clone(),
            copy_text: self.session.id.as_ref().map(|id| id.to_string()),
            controls,
            pointer,
            blocking: self.session.role == Some(Role::Guest) && self.privacy.is_private,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(role: Role) -> OverlayState {
        OverlayState {
            session: SessionSnapshot {
                id: Some(SessionId::new()),
                role: Some(role),
                status: ConnectionStatus::Connected,
                peer_connected: true,
            },
            ..OverlayState::default()
        }
    }

    #[test]
    fn idle_offers_start_and_join() {
        let view = OverlayView::default();
        assert_eq!(view.status, ConnectionStatus::Idle);
        assert_eq!(view.controls, vec![Control::Start, Control::Join]);
        assert!(view.session_id.is_none());
        assert!(view.copy_text.is_none());
        assert!(view.pointer.is_none());
        assert!(!view.blocking);
    }

    #[test]
    fn connected_offers_leave_and_copy() {
        let state = connected(Role::Host);
        let view = state.view();
        assert_eq!(view.controls, vec![Control::Leave]);
        assert_eq!(
            view.copy_text,
            state.session.id.as_ref().map(ToString::to_string)
        );
    }

    #[test]
    fn pointer_dot_is_labelled_with_the_other_role() {
        let mut state = connected(Role::Guest);
        assert!(state.view().pointer.is_none());

        state.pointer = Some(RemotePointer { x: 3.0, y: 4.0 });
        let dot = state.view().pointer.unwrap();
        assert_eq!((dot.x, dot.y), (3.0, 4.0));
        assert_eq!(dot.label, "Host");
        assert_eq!(dot.color, "#3b82f6");

        let mut host = connected(Role::Host);
        host.pointer = Some(RemotePointer { x: 0.0, y: 0.0 });
        assert_eq!(host.view().pointer.unwrap().label, "Guest");
    }

    #[test]
    fn private_guest_is_blocked_and_loses_the_dot() {
        let mut state = connected(Role::Guest);
        state.pointer = Some(RemotePointer { x: 3.0, y: 4.0 });
        state.privacy.is_private = true;
        let view = state.view();
        assert!(view.blocking);
        assert!(view.pointer.is_none());
    }

    #[test]
    fn host_is_never_blocked() {
        let mut state = connected(Role::Host);
        state.privacy.is_private = true;
        assert!(!state.view().blocking);
    }

    #[test]
    fn error_status_offers_start_and_join_again() {
        let mut state = connected(Role::Guest);
        state.session.status = ConnectionStatus::Error;
        assert_eq!(state.view().controls, vec![Control::Start, Control::Join]);
    }
}
