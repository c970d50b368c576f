mod authenticator;
mod media_engine;
mod signaling_channel;

pub use authenticator::{Authenticator, Credentials, StaticAuthenticator};
pub use media_engine::{MediaEvent, MediaSessionEngine, SdpKind};
pub use signaling_channel::{SignalingChannel, SignalingEvent};

use std::sync::Arc;

/// Callback a collaborator invokes, on any thread, to deliver an event.
pub type EventSink<E> = Arc<dyn Fn(E) + Send + Sync>;

/// Returned by `subscribe`, handed back to `unsubscribe` at teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);
