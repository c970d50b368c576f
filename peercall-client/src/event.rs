use crate::error::CallError;
use peercall_core::{Peer, PeerId, SessionId, SessionState};

/// Notifications published by the controller for presentation layers.
///
/// Every event is emitted on the apply thread, in the order the controller
/// produced it.
#[derive(Debug, Clone)]
pub enum CallEvent {
    StateChanged {
        session_id: SessionId,
        peer_id: Option<PeerId>,
        from: SessionState,
        to: SessionState,
    },
    PeerJoined(Peer),
    PeerStatusChanged(Peer),
    /// The peer went offline; lists showing it should drop it.
    PeerWentOffline(PeerId),
    /// The signaling connection was lost; any peer list is stale.
    PeerListCleared,
    ConnectionChanged {
        connected: bool,
        error: Option<String>,
    },
    TextMessage {
        sender_id: PeerId,
        text: String,
    },
    Warning(String),
    Error(CallError),
}
