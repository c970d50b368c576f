use peercall_client::{CallError, ChannelError, ControllerConfig, MediaError, MediaEvent};
use peercall_core::{IceCandidate, SessionState, SignalingMessage};

use crate::integration::{create_test_controller, init_tracing};
use crate::utils::{LOCAL_ID, MockMediaEngine, errors, transitions, warnings};

#[tokio::test]
async fn test_offer_send_failure_aborts_to_idle() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.controller.start_call("peer-b").unwrap();
    tc.media.emit(MediaEvent::PeerReady);
    tc.settle().await;
    assert_eq!(tc.state(), SessionState::OfferSent);

    tc.channel.set_fail_sends(true);
    tc.media.emit(MediaEvent::SdpOfferReady("sdp".into()));
    tc.settle().await;

    assert_eq!(tc.state(), SessionState::Idle);
    assert_eq!(tc.media.close_count(), 1);

    let events = tc.events();
    assert_eq!(
        errors(&events),
        vec![CallError::Channel(ChannelError("relay unreachable".into()))]
    );
    assert_eq!(
        transitions(&events),
        vec![
            SessionState::AwaitingMediaReady,
            SessionState::OfferSent,
            SessionState::Closing,
            SessionState::Idle
        ]
    );
}

#[tokio::test]
async fn test_ice_send_failure_is_a_warning() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.receive("peer-a", &SignalingMessage::offer(LOCAL_ID.into(), "sdp-a"))
        .await
        .unwrap();
    tc.events();

    tc.channel.set_fail_sends(true);
    tc.media.emit(MediaEvent::IceCandidateReady(IceCandidate::new(
        "candidate:1 1 udp 1 10.0.0.1 1 typ host",
        0,
        "0",
    )));
    tc.settle().await;

    let events = tc.events();
    assert_eq!(warnings(&events).len(), 1);
    assert!(errors(&events).is_empty());
    assert_eq!(tc.state(), SessionState::AnswerPending);
}

#[tokio::test]
async fn test_create_offer_failure_is_reported() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.media.set_fail_create_offer(true);
    tc.controller.start_call("peer-b").unwrap();
    tc.media.emit(MediaEvent::PeerReady);
    tc.settle().await;

    assert_eq!(tc.state(), SessionState::Idle);
    assert_eq!(
        errors(&tc.events()),
        vec![CallError::Media(MediaError("no local tracks".into()))]
    );
    assert!(tc.channel.sent().is_empty());
}

#[tokio::test]
async fn test_empty_peer_id_is_rejected() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    assert_eq!(tc.controller.start_call(""), Err(CallError::EmptyPeerId));
    assert_eq!(tc.state(), SessionState::Idle);
    assert!(tc.media.calls().is_empty());
}
