use crate::error::MediaError;
use crate::external::{EventSink, SubscriptionId};
use peercall_core::IceCandidate;
use peercall_core::utils::{SDP_KIND_ANSWER, SDP_KIND_OFFER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

impl SdpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SdpKind::Offer => SDP_KIND_OFFER,
            SdpKind::Answer => SDP_KIND_ANSWER,
        }
    }
}

/// Events raised by the media engine, typically on its worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// The engine can now produce an offer.
    PeerReady,
    SdpOfferReady(String),
    SdpAnswerReady(String),
    IceCandidateReady(IceCandidate),
    /// The media connection is up. Optional; not every engine reports it.
    Connected,
}

/// The engine that owns the peer connection. Results of `create_offer` and
/// `create_answer` come back asynchronously as [`MediaEvent`]s.
pub trait MediaSessionEngine: Send + Sync {
    fn initialize(&self) -> Result<(), MediaError>;

    fn add_local_stream(&self, audio_only: bool) -> Result<(), MediaError>;

    fn create_offer(&self) -> Result<(), MediaError>;

    fn create_answer(&self) -> Result<(), MediaError>;

    fn set_remote_description(&self, kind: SdpKind, sdp: &str) -> Result<(), MediaError>;

    fn add_ice_candidate(
        &self,
        candidate: &str,
        sdp_m_line_index: u32,
        sdp_mid: &str,
    ) -> Result<(), MediaError>;

    fn close_peer_connection(&self);

    fn subscribe(&self, sink: EventSink<MediaEvent>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}
