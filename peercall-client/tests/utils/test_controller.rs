use anyhow::{Context, Result};
use peercall_client::{CallEvent, MediaEvent, NegotiationController};
use peercall_core::utils::WIRE_MESSAGE_TYPE;
use peercall_core::{PeerId, SessionState, SignalingMessage, encode};
use tokio::sync::broadcast;

use super::event_helpers::{drain_events, settle};
use super::mock_channel::MockSignalingChannel;
use super::mock_media::MockMediaEngine;

/// Id the test controller presents to the relay.
pub const LOCAL_ID: &str = "local-device";

/// A controller wired to mocks, plus a receiver subscribed before anything ran.
pub struct TestController {
    pub controller: NegotiationController,
    pub channel: MockSignalingChannel,
    pub media: MockMediaEngine,
    pub events: broadcast::Receiver<CallEvent>,
}

impl TestController {
    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    pub fn peer(&self) -> Option<PeerId> {
        self.controller.session().peer_id.clone()
    }

    pub async fn settle(&mut self) -> usize {
        settle(&mut self.controller).await
    }

    pub fn events(&mut self) -> Vec<CallEvent> {
        drain_events(&mut self.events)
    }

    /// Feed an encoded negotiation message from `sender` through the relay
    /// subscription, then run it.
    pub async fn receive(&mut self, sender: &str, message: &SignalingMessage) -> Result<()> {
        let payload = encode(message).context("Failed to encode inbound message")?;
        self.channel
            .emit(peercall_client::SignalingEvent::NewMessage {
                sender_id: PeerId::from(sender),
                message_type: WIRE_MESSAGE_TYPE.to_owned(),
                payload,
            });
        self.settle().await;
        Ok(())
    }

    /// Start a call and bring it to `OfferSent` with the offer delivered.
    pub async fn call_until_offer_sent(&mut self, peer: &str) -> Result<()> {
        self.controller
            .start_call(peer)
            .context("start_call failed")?;
        self.media.emit(MediaEvent::PeerReady);
        self.settle().await;
        anyhow::ensure!(
            self.state() == SessionState::OfferSent,
            "expected OfferSent, got {}",
            self.state()
        );

        self.media
            .emit(MediaEvent::SdpOfferReady(format!("offer-for-{}", peer)));
        self.settle().await;
        Ok(())
    }
}
