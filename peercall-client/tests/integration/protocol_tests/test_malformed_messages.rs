use peercall_client::{CallError, ControllerConfig, SignalingEvent};
use peercall_core::utils::WIRE_MESSAGE_TYPE;
use peercall_core::{DecodeError, PeerId, SessionState, SignalingMessage};

use crate::integration::{create_test_controller, init_tracing};
use crate::utils::{LOCAL_ID, MockMediaEngine, errors, transitions};

fn raw(sender: &str, message_type: &str, payload: &str) -> SignalingEvent {
    SignalingEvent::NewMessage {
        sender_id: PeerId::from(sender),
        message_type: message_type.to_owned(),
        payload: payload.to_owned(),
    }
}

#[tokio::test]
async fn test_short_ice_payload_is_reported_and_dropped() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.call_until_offer_sent("peer-b").await.unwrap();
    tc.events();
    let calls_before = tc.media.calls().len();

    tc.channel.emit(raw(
        "peer-b",
        WIRE_MESSAGE_TYPE,
        r#"{"MessageType":3,"Data":"candidate:1 1 udp 1 1.2.3.4 5 typ host|0","TargetId":"local-device","IceDataSeparator":"|"}"#,
    ));
    tc.settle().await;

    let events = tc.events();
    assert_eq!(
        errors(&events),
        vec![CallError::Decode {
            sender: PeerId::from("peer-b"),
            source: DecodeError::IceArity { found: 2 },
        }]
    );
    assert!(transitions(&events).is_empty());
    assert_eq!(tc.state(), SessionState::OfferSent);
    assert_eq!(tc.media.calls().len(), calls_before);
}

#[tokio::test]
async fn test_garbage_and_unknown_tags_change_nothing() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());

    tc.channel.emit(raw("peer-b", WIRE_MESSAGE_TYPE, "not json at all"));
    tc.channel.emit(raw(
        "peer-b",
        WIRE_MESSAGE_TYPE,
        r#"{"MessageType":0,"Data":"x","TargetId":"local-device"}"#,
    ));
    tc.settle().await;

    let errs = errors(&tc.events());
    assert_eq!(errs.len(), 2);
    assert!(matches!(
        &errs[0],
        CallError::Decode { source: DecodeError::Json(_), .. }
    ));
    assert!(matches!(
        &errs[1],
        CallError::Decode { source: DecodeError::UnknownMessageType(0), .. }
    ));
    assert_eq!(tc.state(), SessionState::Idle);
    assert!(tc.media.calls().is_empty());
}

#[tokio::test]
async fn test_other_message_types_are_ignored() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.channel.emit(raw("peer-b", "PRESENCE_PING", "{}"));
    tc.settle().await;

    assert!(tc.events().is_empty());
    assert!(tc.media.calls().is_empty());
}

#[tokio::test]
async fn test_set_peer_is_decoded_and_ignored() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.receive("peer-b", &SignalingMessage::set_peer(LOCAL_ID.into()))
        .await
        .unwrap();

    assert!(errors(&tc.events()).is_empty());
    assert_eq!(tc.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_direct_incoming_message_returns_decode_error() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    let result = tc
        .controller
        .on_incoming_message("peer-b", WIRE_MESSAGE_TYPE, "{");

    assert!(matches!(result, Err(CallError::Decode { .. })));
    assert_eq!(errors(&tc.events()).len(), 1);
}
