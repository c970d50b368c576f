use crate::error::MediaError;
use crate::external::{EventSink, MediaEvent, MediaSessionEngine, SdpKind, SubscriptionId};
use peercall_core::IceCandidate;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ScriptedMediaOptions {
    /// How long after `initialize` the engine reports `PeerReady`.
    pub ready_delay: Duration,
    /// Never report `PeerReady`.
    pub never_ready: bool,
    /// Local candidates emitted after each offer or answer.
    pub candidates: u16,
    /// Report `Connected` once an answer has been produced.
    pub report_connected: bool,
}

impl Default for ScriptedMediaOptions {
    fn default() -> Self {
        Self {
            ready_delay: Duration::ZERO,
            never_ready: false,
            candidates: 2,
            report_connected: true,
        }
    }
}

#[derive(Default)]
struct ScriptState {
    initialized: bool,
    // Bumped on close so a delayed PeerReady from an old init is dropped.
    generation: u64,
    remote_offer: Option<String>,
    remote_answer: Option<String>,
    remote_candidates: Vec<IceCandidate>,
    local_streams: Vec<bool>,
    offers_created: usize,
    answers_created: usize,
    closed_count: usize,
    next_subscription: u64,
    sinks: Vec<(SubscriptionId, EventSink<MediaEvent>)>,
}

/// A media engine that fakes SDP and host candidates. Events are raised on
/// the calling thread, or on a runtime task when a ready delay is set.
#[derive(Clone)]
pub struct ScriptedMediaEngine {
    label: String,
    options: ScriptedMediaOptions,
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedMediaEngine {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_options(label, ScriptedMediaOptions::default())
    }

    pub fn with_options(label: impl Into<String>, options: ScriptedMediaOptions) -> Self {
        Self {
            label: label.into(),
            options,
            state: Arc::new(Mutex::new(ScriptState::default())),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn remote_offer(&self) -> Option<String> {
        self.lock().remote_offer.clone()
    }

    pub fn remote_answer(&self) -> Option<String> {
        self.lock().remote_answer.clone()
    }

    pub fn remote_candidates(&self) -> Vec<IceCandidate> {
        self.lock().remote_candidates.clone()
    }

    /// `audio_only` flag of every `add_local_stream` call.
    pub fn local_streams(&self) -> Vec<bool> {
        self.lock().local_streams.clone()
    }

    pub fn offers_created(&self) -> usize {
        self.lock().offers_created
    }

    pub fn answers_created(&self) -> usize {
        self.lock().answers_created
    }

    pub fn closed_count(&self) -> usize {
        self.lock().closed_count
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: MediaEvent) {
        let sinks: Vec<_> = self.lock().sinks.iter().map(|(_, s)| s.clone()).collect();
        for sink in sinks {
            sink(event.clone());
        }
    }

    fn emit_ready_if_current(&self, generation: u64) {
        let current = {
            let state = self.lock();
            state.initialized && state.generation == generation
        };
        if current {
            debug!("[{}] media ready", self.label);
            self.emit(MediaEvent::PeerReady);
        }
    }

    fn fake_sdp(&self, kind: SdpKind, serial: usize) -> String {
        format!(
            "v=0\r\no=- {} {} IN IP4 127.0.0.1\r\ns={}\r\nt=0 0\r\na=type:{}\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=mid:0\r\n",
            serial,
            serial,
            self.label,
            kind.as_str()
        )
    }

    fn emit_candidates(&self) {
        for n in 0..self.options.candidates {
            let priority = 2_130_706_431u32.saturating_sub(u32::from(n));
            let port = 50_000 + n;
            self.emit(MediaEvent::IceCandidateReady(IceCandidate::new(
                format!("candidate:{} 1 udp {} 127.0.0.1 {} typ host", n, priority, port),
                0,
                "0",
            )));
        }
    }
}

impl MediaSessionEngine for ScriptedMediaEngine {
    fn initialize(&self) -> Result<(), MediaError> {
        let generation = {
            let mut state = self.lock();
            state.initialized = true;
            state.generation
        };
        debug!("[{}] media engine initialized", self.label);

        if self.options.never_ready {
            return Ok(());
        }

        match Handle::try_current() {
            Ok(runtime) if !self.options.ready_delay.is_zero() => {
                let engine = self.clone();
                let delay = self.options.ready_delay;
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    engine.emit_ready_if_current(generation);
                });
            }
            _ => self.emit_ready_if_current(generation),
        }
        Ok(())
    }

    fn add_local_stream(&self, audio_only: bool) -> Result<(), MediaError> {
        let mut state = self.lock();
        if !state.initialized {
            return Err(MediaError("add_local_stream before initialize".into()));
        }
        state.local_streams.push(audio_only);
        Ok(())
    }

    fn create_offer(&self) -> Result<(), MediaError> {
        let serial = {
            let mut state = self.lock();
            if !state.initialized {
                return Err(MediaError("create_offer before initialize".into()));
            }
            state.offers_created += 1;
            state.offers_created
        };

        self.emit(MediaEvent::SdpOfferReady(self.fake_sdp(SdpKind::Offer, serial)));
        self.emit_candidates();
        Ok(())
    }

    fn create_answer(&self) -> Result<(), MediaError> {
        let serial = {
            let mut state = self.lock();
            if state.remote_offer.is_none() {
                return Err(MediaError("create_answer without a remote offer".into()));
            }
            state.answers_created += 1;
            state.answers_created
        };

        self.emit(MediaEvent::SdpAnswerReady(self.fake_sdp(SdpKind::Answer, serial)));
        self.emit_candidates();
        if self.options.report_connected {
            self.emit(MediaEvent::Connected);
        }
        Ok(())
    }

    fn set_remote_description(&self, kind: SdpKind, sdp: &str) -> Result<(), MediaError> {
        if sdp.is_empty() {
            return Err(MediaError(format!("empty remote {}", kind.as_str())));
        }
        let mut state = self.lock();
        match kind {
            SdpKind::Offer => state.remote_offer = Some(sdp.to_owned()),
            SdpKind::Answer => state.remote_answer = Some(sdp.to_owned()),
        }
        Ok(())
    }

    fn add_ice_candidate(
        &self,
        candidate: &str,
        sdp_m_line_index: u32,
        sdp_mid: &str,
    ) -> Result<(), MediaError> {
        self.lock()
            .remote_candidates
            .push(IceCandidate::new(candidate, sdp_m_line_index, sdp_mid));
        Ok(())
    }

    fn close_peer_connection(&self) {
        let mut state = self.lock();
        state.initialized = false;
        state.generation += 1;
        state.remote_offer = None;
        state.remote_answer = None;
        state.remote_candidates.clear();
        state.closed_count += 1;
        debug!("[{}] peer connection closed", self.label);
    }

    fn subscribe(&self, sink: EventSink<MediaEvent>) -> SubscriptionId {
        let mut state = self.lock();
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;
        state.sinks.push((id, sink));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().sinks.retain(|(sub, _)| *sub != id);
    }
}
