use peercall_core::utils::{DEFAULT_ICE_SEPARATOR, TEXT_MESSAGE_TYPE, WIRE_MESSAGE_TYPE};
use std::time::Duration;

/// What to do when an Offer arrives while our own Offer to the same peer is
/// still unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfferCollisionPolicy {
    /// The inbound Offer always replaces the outbound attempt.
    #[default]
    LastOfferWins,
    /// The side whose user id sorts lower keeps its own Offer and ignores the
    /// remote one. Needs an authenticator to know the local id.
    LowestIdKeepsOffer,
}

/// Reaction to `RequestFailed` events from the signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestFailurePolicy {
    /// Surface a warning and keep negotiating.
    #[default]
    Warn,
    /// Close the active session once this many failures were seen during it.
    CloseAfter(u32),
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub readiness_timeout: Duration,
    /// Period of the apply loop driven by `NegotiationController::run`.
    pub tick_interval: Duration,
    pub wire_message_type: String,
    pub text_message_type: String,
    pub ice_separator: char,
    pub reliable: bool,
    pub offer_collision: OfferCollisionPolicy,
    pub request_failure: RequestFailurePolicy,
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            readiness_timeout: Duration::from_secs(10),
            tick_interval: Duration::from_millis(16),
            wire_message_type: WIRE_MESSAGE_TYPE.to_owned(),
            text_message_type: TEXT_MESSAGE_TYPE.to_owned(),
            ice_separator: DEFAULT_ICE_SEPARATOR,
            reliable: true,
            offer_collision: OfferCollisionPolicy::default(),
            request_failure: RequestFailurePolicy::default(),
            event_capacity: 256,
        }
    }
}

impl ControllerConfig {
    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_ice_separator(mut self, separator: char) -> Self {
        self.ice_separator = separator;
        self
    }

    pub fn with_offer_collision(mut self, policy: OfferCollisionPolicy) -> Self {
        self.offer_collision = policy;
        self
    }

    pub fn with_request_failure(mut self, policy: RequestFailurePolicy) -> Self {
        self.request_failure = policy;
        self
    }
}
