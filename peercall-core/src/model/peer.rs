use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque participant identifier assigned by the signaling relay.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
pub enum PeerStatus {
    Online,
    Offline,
}

/// A remote participant as announced by the signaling relay.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Peer {
    pub user_id: PeerId,
    /// Display name, not unique.
    pub user_name: String,
    pub status: PeerStatus,
}

impl Peer {
    pub fn new(user_id: impl Into<PeerId>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            status: PeerStatus::Online,
        }
    }

    pub fn with_status(mut self, status: PeerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_online(&self) -> bool {
        self.status == PeerStatus::Online
    }
}
