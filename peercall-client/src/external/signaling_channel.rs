use crate::error::ChannelError;
use crate::external::{Credentials, EventSink, SubscriptionId};
use peercall_core::{Peer, PeerId};

/// Events raised by the signaling relay client. They may arrive on any thread.
#[derive(Debug, Clone)]
pub enum SignalingEvent {
    NewPeer(Peer),
    PeerStatusChanged(Peer),
    ConnectionChanged {
        connected: bool,
        error: Option<String>,
    },
    NewMessage {
        sender_id: PeerId,
        message_type: String,
        payload: String,
    },
    RequestFailed(String),
}

/// Client side of the always-reachable relay.
///
/// Implementations own their network I/O; `send_message` only has to hand the
/// message off and report whether that succeeded.
pub trait SignalingChannel: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<(), ChannelError>;

    fn disconnect(&self) -> Result<(), ChannelError>;

    fn send_message(
        &self,
        target_id: &PeerId,
        broadcast: bool,
        message_type: &str,
        payload: &str,
        reliable: bool,
    ) -> Result<(), ChannelError>;

    fn subscribe(&self, sink: EventSink<SignalingEvent>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}
