use crate::config::ControllerConfig;
use crate::dispatcher::{DispatchHandle, Dispatcher};
use crate::error::CallError;
use crate::event::CallEvent;
use crate::external::{
    Authenticator, EventSink, MediaEvent, MediaSessionEngine, SignalingChannel, SignalingEvent,
    SubscriptionId,
};
use crate::registry::PeerRegistry;
use peercall_core::{PeerId, SessionId, SessionState, SignalingMessage, encode};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

mod call_impl;
mod handle_media_impl;
mod handle_signal_impl;

/// The one negotiation the controller is currently driving.
#[derive(Debug, Clone)]
pub struct NegotiationSession {
    pub id: SessionId,
    /// `None` while idle.
    pub peer_id: Option<PeerId>,
    pub state: SessionState,
    /// When the media engine reported it could produce an offer. Informational
    /// only; the readiness timeout runs from `start_call`.
    pub ready_since: Option<Instant>,
}

impl NegotiationSession {
    fn idle() -> Self {
        Self {
            id: SessionId::new(),
            peer_id: None,
            state: SessionState::Idle,
            ready_since: None,
        }
    }

    pub fn is_with(&self, peer_id: &PeerId) -> bool {
        self.peer_id.as_ref() == Some(peer_id)
    }
}

/// State touched only on the apply thread.
pub(crate) struct ControllerInner {
    config: ControllerConfig,
    channel: Arc<dyn SignalingChannel>,
    media: Arc<dyn MediaSessionEngine>,
    authenticator: Option<Arc<dyn Authenticator>>,
    registry: PeerRegistry,
    session: NegotiationSession,
    media_initialized: bool,
    media_ready: bool,
    media_ready_tx: Arc<watch::Sender<bool>>,
    /// Bumped whenever the media engine is closed or initialized; a
    /// `PeerReady` queued under an older epoch is dropped.
    media_epoch: Arc<AtomicU64>,
    readiness_deadline: Instant,
    connected: bool,
    request_failures: u32,
    events: broadcast::Sender<CallEvent>,
    dispatch: DispatchHandle<ControllerInner>,
    runtime: Handle,
}

/// Drives call setup and teardown over a signaling relay.
///
/// The controller is owned by the apply thread. Collaborator callbacks and
/// [`ControllerHandle`] calls from other threads only enqueue work; it runs
/// when the owner calls [`tick`](Self::tick) or while [`run`](Self::run) is
/// looping.
pub struct NegotiationController {
    inner: ControllerInner,
    dispatcher: Dispatcher<ControllerInner>,
    signaling_subscription: SubscriptionId,
    media_subscription: SubscriptionId,
}

impl NegotiationController {
    /// Subscribes to both collaborators. Must be called inside a tokio runtime,
    /// which hosts the media readiness waits.
    pub fn new(
        channel: Arc<dyn SignalingChannel>,
        media: Arc<dyn MediaSessionEngine>,
        config: ControllerConfig,
    ) -> Result<Self, CallError> {
        let runtime = Handle::try_current().map_err(|_| CallError::NoRuntime)?;
        let dispatcher = Dispatcher::new();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (media_ready_tx, _) = watch::channel(false);
        let media_ready_tx = Arc::new(media_ready_tx);
        let media_epoch = Arc::new(AtomicU64::new(0));

        let signaling_subscription = channel.subscribe(signaling_sink(dispatcher.handle()));
        let media_subscription = media.subscribe(media_sink(
            dispatcher.handle(),
            media_ready_tx.clone(),
            media_epoch.clone(),
        ));

        let inner = ControllerInner {
            config,
            channel,
            media,
            authenticator: None,
            registry: PeerRegistry::new(),
            session: NegotiationSession::idle(),
            media_initialized: false,
            media_ready: false,
            media_ready_tx,
            media_epoch,
            readiness_deadline: Instant::now(),
            connected: false,
            request_failures: 0,
            events,
            dispatch: dispatcher.handle(),
            runtime,
        };

        Ok(Self {
            inner,
            dispatcher,
            signaling_subscription,
            media_subscription,
        })
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.inner.authenticator = Some(authenticator);
        self
    }

    /// Runs everything queued since the previous tick. Returns how many
    /// actions ran.
    pub fn tick(&mut self) -> usize {
        let report = self.dispatcher.drain(&mut self.inner);
        for failure in report.failures {
            self.inner.report(failure);
        }
        report.executed
    }

    /// Ticks on a fixed interval until `shutdown` turns true or its sender is
    /// dropped. Any active call is ended on the way out.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Negotiation loop started");

        let mut interval = tokio::time::interval(self.inner.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested. Stopping negotiation loop.");
                        break;
                    }
                }
            }
        }

        self.tick();
        let _ = self.end_call();
        info!("Negotiation loop finished");
    }

    pub fn start_call(&mut self, peer_id: impl Into<PeerId>) -> Result<(), CallError> {
        let peer_id = peer_id.into();
        self.direct(move |inner| inner.start_call(peer_id))
    }

    pub fn end_call(&mut self) -> Result<(), CallError> {
        self.direct(|inner| inner.end_call())
    }

    /// Feeds a relay message in directly, for hosts that receive messages on
    /// the apply thread themselves.
    pub fn on_incoming_message(
        &mut self,
        sender_id: impl Into<PeerId>,
        message_type: &str,
        payload: &str,
    ) -> Result<(), CallError> {
        let sender_id = sender_id.into();
        self.direct(move |inner| inner.handle_incoming_message(sender_id, message_type, payload))
    }

    pub fn connect(&mut self) -> Result<(), CallError> {
        self.direct(|inner| inner.connect())
    }

    pub fn disconnect(&mut self) -> Result<(), CallError> {
        self.direct(|inner| inner.disconnect())
    }

    pub fn send_text(&mut self, peer_id: impl Into<PeerId>, text: &str) -> Result<(), CallError> {
        let peer_id = peer_id.into();
        self.direct(move |inner| inner.send_text(peer_id, text))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.inner.events.subscribe()
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            dispatch: self.dispatcher.handle(),
            registry: self.inner.registry.clone(),
            events: self.inner.events.clone(),
        }
    }

    pub fn registry(&self) -> PeerRegistry {
        self.inner.registry.clone()
    }

    pub fn session(&self) -> &NegotiationSession {
        &self.inner.session
    }

    pub fn state(&self) -> SessionState {
        self.inner.session.state
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected
    }

    pub fn is_media_ready(&self) -> bool {
        self.inner.media_ready
    }

    fn direct<F>(&mut self, f: F) -> Result<(), CallError>
    where
        F: FnOnce(&mut ControllerInner) -> Result<(), CallError>,
    {
        let result = f(&mut self.inner);
        if let Err(e) = &result {
            self.inner.report(e.clone());
        }
        result
    }
}

impl Drop for NegotiationController {
    fn drop(&mut self) {
        self.inner.channel.unsubscribe(self.signaling_subscription);
        self.inner.media.unsubscribe(self.media_subscription);
        debug!("Negotiation controller dropped, collaborators unsubscribed");
    }
}

/// Thread-safe entry point into a running controller. Every call is queued
/// and takes effect on the next tick.
#[derive(Clone)]
pub struct ControllerHandle {
    dispatch: DispatchHandle<ControllerInner>,
    registry: PeerRegistry,
    events: broadcast::Sender<CallEvent>,
}

impl ControllerHandle {
    pub fn start_call(&self, peer_id: impl Into<PeerId>) -> bool {
        let peer_id = peer_id.into();
        self.dispatch
            .enqueue(move |inner: &mut ControllerInner| inner.start_call(peer_id))
    }

    pub fn end_call(&self) -> bool {
        self.dispatch
            .enqueue(|inner: &mut ControllerInner| inner.end_call())
    }

    pub fn incoming_message(
        &self,
        sender_id: impl Into<PeerId>,
        message_type: impl Into<String>,
        payload: impl Into<String>,
    ) -> bool {
        let sender_id = sender_id.into();
        let message_type = message_type.into();
        let payload = payload.into();
        self.dispatch.enqueue(move |inner: &mut ControllerInner| {
            inner.handle_incoming_message(sender_id, &message_type, &payload)
        })
    }

    pub fn send_text(&self, peer_id: impl Into<PeerId>, text: impl Into<String>) -> bool {
        let peer_id = peer_id.into();
        let text = text.into();
        self.dispatch
            .enqueue(move |inner: &mut ControllerInner| inner.send_text(peer_id, &text))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.events.subscribe()
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }
}

fn signaling_sink(dispatch: DispatchHandle<ControllerInner>) -> EventSink<SignalingEvent> {
    Arc::new(move |event: SignalingEvent| {
        dispatch.enqueue(move |inner: &mut ControllerInner| inner.handle_signaling_event(event));
    })
}

fn media_sink(
    dispatch: DispatchHandle<ControllerInner>,
    media_ready_tx: Arc<watch::Sender<bool>>,
    media_epoch: Arc<AtomicU64>,
) -> EventSink<MediaEvent> {
    Arc::new(move |event: MediaEvent| {
        let epoch = media_epoch.load(Ordering::Acquire);
        let is_ready = event == MediaEvent::PeerReady;
        dispatch.enqueue(move |inner: &mut ControllerInner| inner.handle_media_event(event, epoch));
        // Wake readiness waits only after the apply-side PeerReady is queued,
        // so the local stream is attached before the offer is created.
        if is_ready && media_epoch.load(Ordering::Acquire) == epoch {
            media_ready_tx.send_replace(true);
        }
    })
}

impl ControllerInner {
    fn publish(&self, event: CallEvent) {
        let _ = self.events.send(event);
    }

    fn report(&self, error: CallError) {
        self.publish(CallEvent::Error(error));
    }

    fn warn_event(&self, message: String) {
        warn!("{}", message);
        self.publish(CallEvent::Warning(message));
    }

    fn local_id(&self) -> Option<PeerId> {
        self.authenticator.as_ref().map(|auth| auth.user_id())
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.session.state;
        if from == to {
            return;
        }
        self.session.state = to;

        info!(
            "Session {} {} -> {} (peer: {:?})",
            self.session.id, from, to, self.session.peer_id
        );
        self.publish(CallEvent::StateChanged {
            session_id: self.session.id,
            peer_id: self.session.peer_id.clone(),
            from,
            to,
        });
    }

    /// Points the session at a new remote party under a fresh id, leaving the
    /// state for the caller to advance.
    fn retarget(&mut self, peer_id: PeerId) {
        self.session.id = SessionId::new();
        self.session.peer_id = Some(peer_id);
        self.session.ready_since = None;
        self.request_failures = 0;
    }

    fn current_media_epoch(&self) -> u64 {
        self.media_epoch.load(Ordering::Acquire)
    }

    /// Starts a new media epoch and forgets any readiness reported so far.
    fn reset_media_readiness(&mut self) {
        self.media_epoch.fetch_add(1, Ordering::AcqRel);
        self.media_ready = false;
        self.media_ready_tx.send_replace(false);
    }

    fn ensure_media_initialized(&mut self) -> Result<(), CallError> {
        if !self.media_initialized {
            debug!("Initializing media engine");
            // A PeerReady left over from a closed engine must not count. The
            // engine may report readiness from inside initialize().
            self.reset_media_readiness();
            self.media.initialize()?;
            self.media_initialized = true;
        }
        Ok(())
    }

    /// Closing -> Idle, tearing down the peer connection. No-op when idle.
    fn close_session(&mut self, reason: &str) {
        if self.session.state == SessionState::Idle {
            return;
        }

        info!(
            "Closing session {} with {:?}: {}",
            self.session.id, self.session.peer_id, reason
        );
        self.transition(SessionState::Closing);
        self.media.close_peer_connection();
        self.media_initialized = false;
        self.reset_media_readiness();
        self.session.ready_since = None;
        self.transition(SessionState::Idle);
        self.session.peer_id = None;
    }

    /// Back to Idle without touching the media engine.
    fn abandon_session(&mut self) {
        self.session.ready_since = None;
        self.transition(SessionState::Idle);
        self.session.peer_id = None;
    }

    fn send_signaling(&self, message: &SignalingMessage) -> Result<(), CallError> {
        let payload = encode(message)?;
        self.channel.send_message(
            &message.target_id,
            false,
            &self.config.wire_message_type,
            &payload,
            self.config.reliable,
        )?;
        debug!(
            "Sent {:?} to {} ({} bytes)",
            message.message_type,
            message.target_id,
            payload.len()
        );
        Ok(())
    }
}
