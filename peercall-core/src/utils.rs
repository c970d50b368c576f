/// Relay message type that marks negotiation traffic.
pub const WIRE_MESSAGE_TYPE: &str = "MRTKWEBRTC";

/// Relay message type for free-form text between peers.
pub const TEXT_MESSAGE_TYPE: &str = "MESSAGE";

/// Never appears in an ICE candidate line.
pub const DEFAULT_ICE_SEPARATOR: char = '|';

/// Session description kinds accepted by `SetRemoteDescription`.
pub const SDP_KIND_OFFER: &str = "offer";
pub const SDP_KIND_ANSWER: &str = "answer";
