//! Session store: maps session IDs to paired host/guest channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::Instant;

use cobrowse_common::Role;

/// Frames queued for one attached client.
pub type ClientTx = mpsc::Sender<String>;

/// Fires with a reason when the relay drops an attached client.
pub type Eviction = oneshot::Receiver<String>;

/// One attached client.
struct Member {
    tx: ClientTx,
    evict: oneshot::Sender<String>,
}

impl Member {
    fn evict(self, reason: &str) {
        let _ = self.evict.send(reason.to_string());
    }
}

/// A session pairs exactly one host and one guest connection.
struct Session {
    host: Option<Member>,
    guest: Option<Member>,
    /// Start of the current wait for a guest.
    idle_since: Instant,
}

impl Session {
    fn open() -> Self {
        Self {
            host: None,
            guest: None,
            idle_since: Instant::now(),
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<Member> {
        match role {
            Role::Host => &mut self.host,
            Role::Guest => &mut self.guest,
        }
    }

    fn counterpart(&self, role: Role) -> Option<ClientTx> {
        let member = match role {
            Role::Host => self.guest.as_ref(),
            Role::Guest => self.host.as_ref(),
        };
        member.map(|m| m.tx.clone())
    }

    fn is_empty(&self) -> bool {
        self.host.is_none() && self.guest.is_none()
    }
}

/// Why a client could not be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitError {
    NotFound,
    RoleTaken(Role),
}

impl std::fmt::Display for AdmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmitError::NotFound => f.write_str("session not found"),
            AdmitError::RoleTaken(role) => write!(f, "{role} already connected"),
        }
    }
}

/// A successful admission.
#[derive(Debug)]
pub struct Admission {
    /// The counterpart's sender, if it is already attached.
    pub counterpart: Option<ClientTx>,
    pub eviction: Eviction,
}

/// What `leave` found in the client's slot.
#[derive(Debug)]
pub enum Departure {
    /// The slot was this client's and is now free.
    Left { counterpart: Option<ClientTx> },
    /// The slot already belonged to someone else, or the session is gone.
    Superseded,
}

/// Thread-safe session store.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a client under `role`.
    ///
    /// A host opens the session, or takes over the host slot of an existing
    /// one (reconnect); the replaced host is evicted. A guest needs an open
    /// session with a free guest slot.
    pub async fn admit(
        &self,
        session_id: &str,
        role: Role,
        tx: ClientTx,
    ) -> Result<Admission, AdmitError> {
        let mut map = self.sessions.write().await;
        let session = match role {
            Role::Host => map.entry(session_id.to_string()).or_insert_with(Session::open),
            Role::Guest => {
                let session = map.get_mut(session_id).ok_or(AdmitError::NotFound)?;
                if session.guest.is_some() {
                    return Err(AdmitError::RoleTaken(Role::Guest));
                }
                session
            }
        };

        let (evict, eviction) = oneshot::channel();
        if let Some(replaced) = session.slot(role).replace(Member { tx, evict }) {
            tracing::info!(session = %session_id, "Host reconnected, evicting old link");
            replaced.evict("replaced by a newer host connection");
        }
        Ok(Admission {
            counterpart: session.counterpart(role),
            eviction,
        })
    }

    /// Sender of whoever sits opposite `role`.
    pub async fn counterpart(&self, session_id: &str, role: Role) -> Option<ClientTx> {
        self.sessions.read().await.get(session_id)?.counterpart(role)
    }

    /// Detach `tx` from its slot. A slot already taken over by a newer
    /// connection is left alone. The session is removed once both slots
    /// are empty; a guest leaving restarts the host's wait.
    pub async fn leave(&self, session_id: &str, role: Role, tx: &ClientTx) -> Departure {
        let mut map = self.sessions.write().await;
        let Some(session) = map.get_mut(session_id) else {
            return Departure::Superseded;
        };
        let slot = session.slot(role);
        if !slot.as_ref().is_some_and(|m| m.tx.same_channel(tx)) {
            return Departure::Superseded;
        }
        *slot = None;
        if role == Role::Guest {
            session.idle_since = Instant::now();
        }

        let counterpart = session.counterpart(role);
        if session.is_empty() {
            map.remove(session_id);
        }
        Departure::Left { counterpart }
    }

    /// Drop sessions that have waited longer than `max_age` for a guest.
    /// A host still attached is evicted so it learns the session is gone.
    pub async fn reap_stale(&self, max_age: Duration) {
        let mut map = self.sessions.write().await;
        map.retain(|id, session| {
            let stale = session.guest.is_none() && session.idle_since.elapsed() > max_age;
            if stale {
                tracing::info!(session = %id, "Reaping stale session");
                if let Some(host) = session.host.take() {
                    host.evict("session expired");
                }
            }
            !stale
        });
    }

    pub async fn exists(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
