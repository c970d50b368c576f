use peercall_client::{ControllerConfig, SdpKind};
use peercall_core::{IceCandidate, SessionState, SignalingMessage};

use crate::integration::{create_test_controller, init_tracing};
use crate::utils::{LOCAL_ID, MediaCall, MockMediaEngine, transitions, warnings};

#[tokio::test]
async fn test_answer_from_callee_connects() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.call_until_offer_sent("peer-b").await.unwrap();

    tc.receive("peer-b", &SignalingMessage::answer(LOCAL_ID.into(), "sdp-b"))
        .await
        .unwrap();

    assert_eq!(tc.state(), SessionState::Connected);
    assert_eq!(
        tc.media.count(&MediaCall::SetRemoteDescription {
            kind: SdpKind::Answer,
            sdp: "sdp-b".into()
        }),
        1
    );
    assert_eq!(
        transitions(&tc.events()),
        vec![
            SessionState::AwaitingMediaReady,
            SessionState::OfferSent,
            SessionState::Connected
        ]
    );
}

#[tokio::test]
async fn test_answer_from_other_peer_is_dropped() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.call_until_offer_sent("peer-b").await.unwrap();
    tc.events();

    tc.receive("peer-x", &SignalingMessage::answer(LOCAL_ID.into(), "sdp-x"))
        .await
        .unwrap();

    assert_eq!(tc.state(), SessionState::OfferSent);
    assert_eq!(warnings(&tc.events()).len(), 1);
}

#[tokio::test]
async fn test_answer_when_idle_is_dropped() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.receive("peer-b", &SignalingMessage::answer(LOCAL_ID.into(), "sdp-b"))
        .await
        .unwrap();

    assert_eq!(tc.state(), SessionState::Idle);
    assert!(tc.media.calls().is_empty());
    assert_eq!(warnings(&tc.events()).len(), 1);
}

#[tokio::test]
async fn test_ice_from_other_peer_is_dropped() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.call_until_offer_sent("peer-b").await.unwrap();

    let candidate = IceCandidate::new("candidate:3 1 udp 9 10.9.9.9 7000 typ host", 0, "0");
    let ice = SignalingMessage::ice(LOCAL_ID.into(), &candidate, '|').unwrap();
    tc.receive("peer-x", &ice).await.unwrap();

    assert!(tc.media.added_candidates().is_empty());
    assert_eq!(tc.state(), SessionState::OfferSent);
}
