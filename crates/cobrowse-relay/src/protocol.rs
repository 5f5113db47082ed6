//! Relay-level wire protocol. Only the first message is parsed; everything after
//! is forwarded as opaque text frames.

use serde::{Deserialize, Serialize};

use cobrowse_common::Role;

/// First message a client sends to identify itself.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientHello {
    #[serde(rename = "host_hello")]
    HostHello { session_id: String },

    #[serde(rename = "guest_hello")]
    GuestHello { session_id: String },
}

impl ClientHello {
    pub fn into_parts(self) -> (String, Role) {
        match self {
            ClientHello::HostHello { session_id } => (session_id, Role::Host),
            ClientHello::GuestHello { session_id } => (session_id, Role::Guest),
        }
    }
}

/// Messages the relay sends back to clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum RelayControl {
    #[serde(rename = "session_ready")]
    SessionReady { session_id: String },

    #[serde(rename = "peer_connected")]
    PeerConnected,

    #[serde(rename = "peer_disconnected")]
    PeerDisconnected,

    #[serde(rename = "error")]
    Error { message: String },
}

impl RelayControl {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","message":"encode failed"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_hello() {
        let hello: ClientHello =
            serde_json::from_str(r#"{"type":"host_hello","session_id":"abc"}"#).unwrap();
        assert_eq!(hello.into_parts(), ("abc".to_string(), Role::Host));
    }

    #[test]
    fn parses_guest_hello() {
        let hello: ClientHello =
            serde_json::from_str(r#"{"type":"guest_hello","session_id":"abc"}"#).unwrap();
        assert_eq!(hello.into_parts(), ("abc".to_string(), Role::Guest));
    }

    #[test]
    fn rejects_unknown_hello() {
        let res = serde_json::from_str::<ClientHello>(r#"{"type":"viewer_hello","session_id":"x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn response_json_shapes() {
        assert_eq!(RelayControl::PeerConnected.to_json(), r#"{"type":"peer_connected"}"#);
        assert_eq!(
            RelayControl::SessionReady {
                session_id: "s1".into()
            }
            .to_json(),
            r#"{"type":"session_ready","session_id":"s1"}"#
        );
        assert_eq!(
            RelayControl::Error {
                message: "session not found".into()
            }
            .to_json(),
            r#"{"type":"error","message":"session not found"}"#
        );
    }
}
