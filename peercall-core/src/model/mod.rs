mod peer;
mod session;
mod signaling;

pub use peer::{Peer, PeerId, PeerStatus};
pub use session::{SessionId, SessionState};
pub use signaling::{IceCandidate, MessageType, SignalingMessage};
