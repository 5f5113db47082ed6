use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CobrowseError;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Identifier shared by the two peers of one co-browsing session.
///
/// Session ids are typed in by the guest, so parsing is lenient about
/// surrounding whitespace but rejects anything that is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = CobrowseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        uuid::Uuid::parse_str(trimmed)
            .map(|u| Self(u.to_string()))
            .map_err(|_| CobrowseError::InvalidSessionId(trimmed.to_string()))
    }
}

/// Identifier of a single relayed envelope. Also used as the
/// synthetic-origin marker on page mutations caused by that envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvelopeId(uuid::Uuid);

impl EnvelopeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for EnvelopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnvelopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
