use crate::controller::ControllerInner;
use crate::error::CallError;
use crate::external::MediaEvent;
use peercall_core::{IceCandidate, MessageType, SessionState, SignalingMessage};
use tokio::time::Instant;
use tracing::{debug, info};

impl ControllerInner {
    /// `epoch` is the media epoch current when the engine raised the event.
    pub(crate) fn handle_media_event(&mut self, event: MediaEvent, epoch: u64) -> Result<(), CallError> {
        match event {
            MediaEvent::PeerReady => self.on_peer_ready(epoch),
            MediaEvent::SdpOfferReady(sdp) => self.on_local_description(MessageType::Offer, sdp),
            MediaEvent::SdpAnswerReady(sdp) => self.on_local_description(MessageType::Answer, sdp),
            MediaEvent::IceCandidateReady(candidate) => self.on_local_candidate(candidate),
            MediaEvent::Connected => {
                if self.session.state == SessionState::AnswerPending {
                    self.transition(SessionState::Connected);
                } else {
                    debug!("Media connected in state {}", self.session.state);
                }
                Ok(())
            }
        }
    }

    fn on_peer_ready(&mut self, epoch: u64) -> Result<(), CallError> {
        if !self.media_initialized || epoch != self.current_media_epoch() {
            debug!("PeerReady from a closed media session ignored");
            return Ok(());
        }

        info!("Media engine ready");
        self.media_ready = true;
        self.media_ready_tx.send_replace(true);
        if self.session.state == SessionState::AwaitingMediaReady {
            self.session.ready_since = Some(Instant::now());
        }

        self.media.add_local_stream(false)?;
        Ok(())
    }

    /// Ships a locally produced Offer or Answer. If it cannot be delivered the
    /// remote side will never answer, so the session is closed.
    fn on_local_description(&mut self, message_type: MessageType, sdp: String) -> Result<(), CallError> {
        let expected = match message_type {
            MessageType::Offer => SessionState::OfferSent,
            _ => SessionState::AnswerPending,
        };

        let Some(peer_id) = self
            .session
            .peer_id
            .clone()
            .filter(|_| self.session.state == expected)
        else {
            debug!(
                "Dropping local {:?} produced in state {}",
                message_type, self.session.state
            );
            return Ok(());
        };

        let message = match message_type {
            MessageType::Offer => SignalingMessage::offer(peer_id.clone(), sdp),
            _ => SignalingMessage::answer(peer_id.clone(), sdp),
        };

        if let Err(e) = self.send_signaling(&message) {
            self.close_session("failed to deliver session description");
            return Err(e);
        }

        info!("Sent {:?} to {}", message_type, peer_id);
        Ok(())
    }

    fn on_local_candidate(&mut self, candidate: IceCandidate) -> Result<(), CallError> {
        let Some(peer_id) = self
            .session
            .peer_id
            .clone()
            .filter(|_| self.session.state.is_active())
        else {
            debug!("No active session, dropping local candidate");
            return Ok(());
        };

        let message = SignalingMessage::ice(peer_id.clone(), &candidate, self.config.ice_separator)?;
        if let Err(e) = self.send_signaling(&message) {
            self.warn_event(format!("Failed to send ICE candidate to {}: {}", peer_id, e));
        }
        Ok(())
    }
}
