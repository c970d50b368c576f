mod config;
mod controller;
mod dispatcher;
mod error;
mod event;
mod external;
pub mod loopback;
mod registry;

pub use config::{ControllerConfig, OfferCollisionPolicy, RequestFailurePolicy};
pub use controller::{ControllerHandle, NegotiationController, NegotiationSession};
pub use dispatcher::{Action, DispatchHandle, Dispatcher, DrainReport};
pub use error::{CallError, ChannelError, MediaError};
pub use event::CallEvent;
pub use external::{
    Authenticator, Credentials, EventSink, MediaEvent, MediaSessionEngine, SdpKind,
    SignalingChannel, SignalingEvent, StaticAuthenticator, SubscriptionId,
};
pub use registry::PeerRegistry;
