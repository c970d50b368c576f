use peercall_client::{EventSink, MediaError, MediaEvent, MediaSessionEngine, SdpKind, SubscriptionId};
use peercall_core::IceCandidate;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    Initialize,
    AddLocalStream { audio_only: bool },
    CreateOffer,
    CreateAnswer,
    SetRemoteDescription { kind: SdpKind, sdp: String },
    AddIceCandidate(IceCandidate),
    ClosePeerConnection,
}

#[derive(Default)]
struct MockMediaState {
    calls: Vec<MediaCall>,
    sinks: Vec<(SubscriptionId, EventSink<MediaEvent>)>,
    next_id: u64,
    auto_ready: bool,
    fail_create_offer: bool,
}

/// Mock MediaSessionEngine that records calls. Events are raised by the test
/// through [`MockMediaEngine::emit`], except `PeerReady` when auto-ready is on.
#[derive(Clone, Default)]
pub struct MockMediaEngine {
    state: Arc<Mutex<MockMediaState>>,
}

impl MockMediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `PeerReady` from inside every `initialize` call.
    pub fn with_auto_ready(self) -> Self {
        self.state.lock().unwrap().auto_ready = true;
        self
    }

    pub fn set_fail_create_offer(&self, fail: bool) {
        self.state.lock().unwrap().fail_create_offer = fail;
    }

    pub fn emit(&self, event: MediaEvent) {
        let sinks: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .sinks
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect();
        for sink in sinks {
            sink(event.clone());
        }
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &MediaCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn close_count(&self) -> usize {
        self.count(&MediaCall::ClosePeerConnection)
    }

    pub fn added_candidates(&self) -> Vec<IceCandidate> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MediaCall::AddIceCandidate(candidate) => Some(candidate),
                _ => None,
            })
            .collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().unwrap().sinks.len()
    }

    fn record(&self, call: MediaCall) {
        tracing::debug!("[MockMedia] {:?}", call);
        self.state.lock().unwrap().calls.push(call);
    }
}

impl MediaSessionEngine for MockMediaEngine {
    fn initialize(&self) -> Result<(), MediaError> {
        self.record(MediaCall::Initialize);
        let auto_ready = self.state.lock().unwrap().auto_ready;
        if auto_ready {
            self.emit(MediaEvent::PeerReady);
        }
        Ok(())
    }

    fn add_local_stream(&self, audio_only: bool) -> Result<(), MediaError> {
        self.record(MediaCall::AddLocalStream { audio_only });
        Ok(())
    }

    fn create_offer(&self) -> Result<(), MediaError> {
        if self.state.lock().unwrap().fail_create_offer {
            return Err(MediaError("no local tracks".into()));
        }
        self.record(MediaCall::CreateOffer);
        Ok(())
    }

    fn create_answer(&self) -> Result<(), MediaError> {
        self.record(MediaCall::CreateAnswer);
        Ok(())
    }

    fn set_remote_description(&self, kind: SdpKind, sdp: &str) -> Result<(), MediaError> {
        self.record(MediaCall::SetRemoteDescription {
            kind,
            sdp: sdp.to_owned(),
        });
        Ok(())
    }

    fn add_ice_candidate(
        &self,
        candidate: &str,
        sdp_m_line_index: u32,
        sdp_mid: &str,
    ) -> Result<(), MediaError> {
        self.record(MediaCall::AddIceCandidate(IceCandidate::new(
            candidate,
            sdp_m_line_index,
            sdp_mid,
        )));
        Ok(())
    }

    fn close_peer_connection(&self) {
        self.record(MediaCall::ClosePeerConnection);
    }

    fn subscribe(&self, sink: EventSink<MediaEvent>) -> SubscriptionId {
        let mut state = self.state.lock().unwrap();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.sinks.push((id, sink));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.lock().unwrap().sinks.retain(|(sub, _)| *sub != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_ready_emits_on_initialize() {
        let media = MockMediaEngine::new().with_auto_ready();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        media.subscribe(Arc::new(move |event: MediaEvent| {
            sink_seen.lock().unwrap().push(event);
        }));

        media.initialize().unwrap();

        assert_eq!(media.calls(), vec![MediaCall::Initialize]);
        assert_eq!(*seen.lock().unwrap(), vec![MediaEvent::PeerReady]);
    }
}
