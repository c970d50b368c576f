use crate::controller::ControllerInner;
use crate::error::CallError;
use peercall_core::{PeerId, SessionId, SessionState};
use tokio::time::Instant;
use tracing::{debug, info, warn};

impl ControllerInner {
    pub(crate) fn start_call(&mut self, peer_id: PeerId) -> Result<(), CallError> {
        if peer_id.is_empty() {
            return Err(CallError::EmptyPeerId);
        }

        if self.session.state.is_active() {
            self.close_session("superseded by a new call");
        }

        self.ensure_media_initialized()?;

        info!("Calling {}", peer_id);
        self.retarget(peer_id);
        self.transition(SessionState::AwaitingMediaReady);
        self.readiness_deadline = Instant::now() + self.config.readiness_timeout;
        self.spawn_readiness_wait(self.session.id);
        Ok(())
    }

    pub(crate) fn end_call(&mut self) -> Result<(), CallError> {
        if !self.session.state.is_active() {
            debug!("end_call without an active session");
            return Ok(());
        }
        self.close_session("ended locally");
        Ok(())
    }

    pub(crate) fn connect(&mut self) -> Result<(), CallError> {
        let authenticator = self
            .authenticator
            .as_ref()
            .ok_or(CallError::NotAuthenticated)?;
        let credentials = authenticator.credentials()?;

        info!(
            "Connecting to signaling relay as {} ({}) via {}",
            credentials.user_name,
            credentials.user_id,
            authenticator.service_name()
        );
        self.channel.connect(&credentials)?;
        Ok(())
    }

    pub(crate) fn disconnect(&mut self) -> Result<(), CallError> {
        info!("Disconnecting from signaling relay");
        self.channel.disconnect()?;
        Ok(())
    }

    pub(crate) fn send_text(&mut self, peer_id: PeerId, text: &str) -> Result<(), CallError> {
        if peer_id.is_empty() {
            return Err(CallError::EmptyPeerId);
        }
        self.channel.send_message(
            &peer_id,
            false,
            &self.config.text_message_type,
            text,
            self.config.reliable,
        )?;
        Ok(())
    }

    /// Waits off the apply thread for the engine to report `PeerReady`, then
    /// enqueues exactly one continuation: the offer, or the timeout.
    fn spawn_readiness_wait(&self, session_id: SessionId) {
        let mut ready = self.media_ready_tx.subscribe();
        let dispatch = self.dispatch.clone();
        let deadline = self.readiness_deadline;

        self.runtime.spawn(async move {
            let outcome = tokio::time::timeout_at(deadline, ready.wait_for(|ready| *ready))
                .await
                .map(|res| res.is_ok());

            match outcome {
                Ok(true) => {
                    dispatch.enqueue(move |inner: &mut ControllerInner| {
                        inner.on_media_ready(session_id)
                    });
                }
                Ok(false) => debug!("Readiness signal dropped for session {}", session_id),
                Err(_) => {
                    dispatch.enqueue(move |inner: &mut ControllerInner| {
                        inner.on_readiness_timeout(session_id)
                    });
                }
            }
        });
    }

    pub(crate) fn on_media_ready(&mut self, session_id: SessionId) -> Result<(), CallError> {
        if self.session.id != session_id || self.session.state != SessionState::AwaitingMediaReady {
            debug!("Ignoring stale readiness for session {}", session_id);
            return Ok(());
        }
        if !self.media_ready {
            // The wake-up raced with a media epoch change. Keep waiting for
            // the rest of the original window; on_peer_ready raises the
            // signal again.
            debug!("Readiness for session {} not confirmed, waiting again", session_id);
            self.media_ready_tx.send_replace(false);
            self.spawn_readiness_wait(session_id);
            return Ok(());
        }

        if let Err(e) = self.media.create_offer() {
            self.close_session("media engine failed to create an offer");
            return Err(e.into());
        }
        self.transition(SessionState::OfferSent);
        Ok(())
    }

    pub(crate) fn on_readiness_timeout(&mut self, session_id: SessionId) -> Result<(), CallError> {
        if self.session.id != session_id || self.session.state != SessionState::AwaitingMediaReady {
            debug!("Ignoring stale readiness timeout for session {}", session_id);
            return Ok(());
        }
        // Only a PeerReady from the current media epoch sets media_ready.
        if self.media_ready {
            return self.on_media_ready(session_id);
        }

        let peer_id = self.session.peer_id.clone().unwrap_or_default();
        warn!(
            "Media engine not ready after {:?}, abandoning call to {}",
            self.config.readiness_timeout, peer_id
        );
        self.abandon_session();

        Err(CallError::ReadinessTimeout {
            peer_id,
            after: self.config.readiness_timeout,
        })
    }
}
