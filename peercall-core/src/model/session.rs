use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one negotiation attempt. A new id is minted for every call or
/// accepted offer so that late continuations can tell they are stale.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
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

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingMediaReady,
    OfferSent,
    AnswerPending,
    Connected,
    Closing,
}

impl SessionState {
    /// Offering, answering or connected.
    pub fn is_negotiating(&self) -> bool {
        matches!(
            self,
            SessionState::OfferSent | SessionState::AnswerPending | SessionState::Connected
        )
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle | SessionState::Closing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingMediaReady => "awaiting_media_ready",
            SessionState::OfferSent => "offer_sent",
            SessionState::AnswerPending => "answer_pending",
            SessionState::Connected => "connected",
            SessionState::Closing => "closing",
        };
        f.write_str(name)
    }
}
