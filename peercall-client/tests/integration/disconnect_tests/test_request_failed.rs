use peercall_client::{CallError, ControllerConfig, RequestFailurePolicy, SignalingEvent};
use peercall_core::SessionState;

use crate::integration::{create_test_controller, init_tracing};
use crate::utils::{MockMediaEngine, errors, warnings};

#[tokio::test]
async fn test_request_failed_is_only_a_warning_by_default() {
    init_tracing();

    let mut tc = create_test_controller(ControllerConfig::default(), MockMediaEngine::new());
    tc.call_until_offer_sent("peer-b").await.unwrap();
    tc.events();

    for _ in 0..5 {
        tc.channel
            .emit(SignalingEvent::RequestFailed("503 from relay".into()));
    }
    tc.settle().await;

    let events = tc.events();
    assert_eq!(warnings(&events).len(), 5);
    assert!(errors(&events).is_empty());
    assert_eq!(tc.state(), SessionState::OfferSent);
    assert_eq!(tc.media.close_count(), 0);
}

#[tokio::test]
async fn test_close_after_policy_closes_active_session() {
    init_tracing();

    let config =
        ControllerConfig::default().with_request_failure(RequestFailurePolicy::CloseAfter(2));
    let mut tc = create_test_controller(config, MockMediaEngine::new());
    tc.call_until_offer_sent("peer-b").await.unwrap();
    tc.events();

    tc.channel
        .emit(SignalingEvent::RequestFailed("timeout".into()));
    tc.settle().await;
    assert_eq!(tc.state(), SessionState::OfferSent);

    tc.channel
        .emit(SignalingEvent::RequestFailed("timeout again".into()));
    tc.settle().await;

    assert_eq!(tc.state(), SessionState::Idle);
    assert_eq!(tc.media.close_count(), 1);
    assert_eq!(
        errors(&tc.events()),
        vec![CallError::Transport("timeout again".into())]
    );
}

#[tokio::test]
async fn test_close_after_policy_ignores_failures_while_idle() {
    init_tracing();

    let config =
        ControllerConfig::default().with_request_failure(RequestFailurePolicy::CloseAfter(1));
    let mut tc = create_test_controller(config, MockMediaEngine::new());

    tc.channel
        .emit(SignalingEvent::RequestFailed("presence poll failed".into()));
    tc.settle().await;

    let events = tc.events();
    assert_eq!(warnings(&events).len(), 1);
    assert!(errors(&events).is_empty());

    // The count restarts with the next session.
    tc.call_until_offer_sent("peer-b").await.unwrap();
    assert_eq!(tc.state(), SessionState::OfferSent);
}
