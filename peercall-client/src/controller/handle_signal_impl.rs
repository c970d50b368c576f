use crate::config::{OfferCollisionPolicy, RequestFailurePolicy};
use crate::controller::ControllerInner;
use crate::error::CallError;
use crate::event::CallEvent;
use crate::external::{SdpKind, SignalingEvent};
use peercall_core::{IceCandidate, MessageType, Peer, PeerId, PeerStatus, SessionState, decode};
use tracing::{debug, info, warn};

impl ControllerInner {
    pub(crate) fn handle_signaling_event(&mut self, event: SignalingEvent) -> Result<(), CallError> {
        match event {
            SignalingEvent::NewPeer(peer) => {
                info!("New peer {} ({})", peer.user_name, peer.user_id);
                self.registry.upsert(peer.clone());
                self.publish(CallEvent::PeerJoined(peer));
                Ok(())
            }

            SignalingEvent::PeerStatusChanged(peer) => self.on_peer_status_changed(peer),

            SignalingEvent::ConnectionChanged { connected, error } => {
                self.on_connection_changed(connected, error);
                Ok(())
            }

            SignalingEvent::NewMessage {
                sender_id,
                message_type,
                payload,
            } => self.handle_incoming_message(sender_id, &message_type, &payload),

            SignalingEvent::RequestFailed(message) => self.on_request_failed(message),
        }
    }

    pub(crate) fn handle_incoming_message(
        &mut self,
        sender_id: PeerId,
        message_type: &str,
        payload: &str,
    ) -> Result<(), CallError> {
        if message_type == self.config.text_message_type {
            self.publish(CallEvent::TextMessage {
                sender_id,
                text: payload.to_owned(),
            });
            return Ok(());
        }

        if message_type != self.config.wire_message_type {
            debug!("Ignoring {} message from {}", message_type, sender_id);
            return Ok(());
        }

        let message = decode(payload).map_err(|source| {
            warn!("Dropping malformed message from {}: {}", sender_id, source);
            CallError::Decode {
                sender: sender_id.clone(),
                source,
            }
        })?;

        if let Some(local_id) = self.local_id() {
            if !message.target_id.is_empty() && message.target_id != local_id {
                self.warn_event(format!(
                    "Dropping {:?} from {} addressed to {}",
                    message.message_type, sender_id, message.target_id
                ));
                return Ok(());
            }
        }

        match message.message_type {
            MessageType::Offer => self.on_remote_offer(sender_id, &message.data),
            MessageType::Answer => self.on_remote_answer(sender_id, &message.data),
            MessageType::Ice => {
                let candidate = message
                    .ice_candidate()
                    .map_err(|source| CallError::Decode {
                        sender: sender_id.clone(),
                        source,
                    })?;
                self.on_remote_ice(sender_id, candidate)
            }
            MessageType::SetPeer => {
                debug!("Ignoring SetPeer from {}", sender_id);
                Ok(())
            }
        }
    }

    fn on_peer_status_changed(&mut self, peer: Peer) -> Result<(), CallError> {
        self.registry.set_status(&peer.user_id, peer.status);

        let offline = peer.status == PeerStatus::Offline;
        if offline && self.session.state.is_active() && self.session.is_with(&peer.user_id) {
            warn!("Peer {} went offline during negotiation", peer.user_id);
        }

        let user_id = peer.user_id.clone();
        self.publish(CallEvent::PeerStatusChanged(peer));
        if offline {
            self.publish(CallEvent::PeerWentOffline(user_id));
        }
        Ok(())
    }

    fn on_connection_changed(&mut self, connected: bool, error: Option<String>) {
        self.connected = connected;

        if connected {
            info!("Signaling connected");
        } else {
            match &error {
                Some(reason) => warn!("Signaling disconnected: {}", reason),
                None => info!("Signaling disconnected"),
            }
            self.close_session("signaling connection lost");
            self.publish(CallEvent::PeerListCleared);
        }

        self.publish(CallEvent::ConnectionChanged { connected, error });
    }

    fn on_request_failed(&mut self, message: String) -> Result<(), CallError> {
        self.warn_event(format!("Signaling request failed: {}", message));

        let RequestFailurePolicy::CloseAfter(limit) = self.config.request_failure else {
            return Ok(());
        };
        if !self.session.state.is_active() {
            return Ok(());
        }

        self.request_failures += 1;
        if self.request_failures < limit.max(1) {
            return Ok(());
        }

        self.close_session("too many failed signaling requests");
        Err(CallError::Transport(message))
    }

    fn keeps_own_offer(&self, sender_id: &PeerId) -> bool {
        if self.config.offer_collision != OfferCollisionPolicy::LowestIdKeepsOffer
            || self.session.state != SessionState::OfferSent
            || !self.session.is_with(sender_id)
        {
            return false;
        }
        match self.local_id() {
            Some(local_id) => local_id < *sender_id,
            None => false,
        }
    }

    fn on_remote_offer(&mut self, sender_id: PeerId, sdp: &str) -> Result<(), CallError> {
        if self.keeps_own_offer(&sender_id) {
            info!("Offer collision with {}: keeping our own offer", sender_id);
            return Ok(());
        }

        info!("Received offer from {}", sender_id);
        self.ensure_media_initialized()?;
        self.media.set_remote_description(SdpKind::Offer, sdp)?;
        self.media.create_answer()?;

        let same_session = self.session.state.is_active() && self.session.is_with(&sender_id);
        if !same_session {
            if let (true, Some(previous)) =
                (self.session.state.is_active(), self.session.peer_id.as_ref())
            {
                info!(
                    "Offer from {} supersedes negotiation with {}",
                    sender_id, previous
                );
            }
            self.retarget(sender_id);
        }

        self.transition(SessionState::AnswerPending);
        Ok(())
    }

    fn on_remote_answer(&mut self, sender_id: PeerId, sdp: &str) -> Result<(), CallError> {
        if self.session.state != SessionState::OfferSent {
            self.warn_event(format!(
                "Dropping answer from {} in state {}",
                sender_id, self.session.state
            ));
            return Ok(());
        }
        if !self.session.is_with(&sender_id) {
            self.warn_event(format!(
                "Dropping answer from {}, negotiating with {:?}",
                sender_id, self.session.peer_id
            ));
            return Ok(());
        }

        info!("Received answer from {}", sender_id);
        self.media.set_remote_description(SdpKind::Answer, sdp)?;
        self.request_failures = 0;
        self.transition(SessionState::Connected);
        Ok(())
    }

    fn on_remote_ice(&mut self, sender_id: PeerId, candidate: IceCandidate) -> Result<(), CallError> {
        if !self.session.state.is_active() {
            debug!("No active session, ignoring candidate from {}", sender_id);
            return Ok(());
        }
        if !self.session.is_with(&sender_id) {
            self.warn_event(format!(
                "Dropping candidate from {}, negotiating with {:?}",
                sender_id, self.session.peer_id
            ));
            return Ok(());
        }

        debug!("Adding ICE from {}: {}", sender_id, candidate.candidate);
        self.media.add_ice_candidate(
            &candidate.candidate,
            candidate.sdp_m_line_index,
            &candidate.sdp_mid,
        )?;
        Ok(())
    }
}
