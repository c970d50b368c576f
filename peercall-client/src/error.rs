use peercall_core::{DecodeError, EncodeError, PeerId};
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a [`SignalingChannel`](crate::SignalingChannel) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("signaling channel: {0}")]
pub struct ChannelError(pub String);

/// Failure reported by a [`MediaSessionEngine`](crate::MediaSessionEngine) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("media engine: {0}")]
pub struct MediaError(pub String);

/// Everything the controller reports on its event channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("protocol error in message from {sender}: {source}")]
    Decode {
        sender: PeerId,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("media engine not ready for call to {peer_id} after {after:?}")]
    ReadinessTimeout { peer_id: PeerId, after: Duration },

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("signaling request failed: {0}")]
    Transport(String),

    #[error("dispatched action panicked: {0}")]
    ActionPanicked(String),

    #[error("no tokio runtime available to run the readiness wait")]
    NoRuntime,

    #[error("no authenticator or token available")]
    NotAuthenticated,

    #[error("peer id must not be empty")]
    EmptyPeerId,
}
