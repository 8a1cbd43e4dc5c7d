use crate::integration::{create_test_session, init_tracing};
use crate::utils::TransportCall;
use tether_client::ClientError;
use tether_client::capability::{ConnectionEvent, ConnectionState, LocalStream};
use tether_client::engine::NegotiationState;
use tether_core::{ClientMessage, SdpKind, SessionDescription, Signal};

#[tokio::test]
async fn test_offer_is_answered() {
    init_tracing();
    let mut t = create_test_session("alice");
    let local = LocalStream {
        id: "local".to_owned(),
        tracks: Vec::new(),
    };

    t.session
        .on_offer_received(SessionDescription::offer("v=0 alice"), Some(&local))
        .await
        .unwrap();

    assert_eq!(t.session.state(), NegotiationState::AnswerSent);
    assert!(t.session.is_remote_description_set());
    assert_eq!(
        t.factory.calls(0).await,
        vec![
            TransportCall::AddLocalStream(0),
            TransportCall::SetRemote(SdpKind::Offer),
            TransportCall::CreateAnswer,
            TransportCall::SetLocal(SdpKind::Answer),
        ]
    );

    let Some(ClientMessage::Message(relay)) = t.outbound.recv().await else {
        panic!("expected a relayed answer");
    };
    assert_eq!(relay.remote_user_id.as_str(), "alice");
    assert!(matches!(relay.signal, Signal::Answer { .. }));
}

#[tokio::test]
async fn test_callee_connected_when_transport_connects() {
    init_tracing();
    let mut t = create_test_session("alice");

    t.session
        .on_offer_received(SessionDescription::offer("v=0 alice"), None)
        .await
        .unwrap();
    assert_eq!(t.session.state(), NegotiationState::AnswerSent);

    t.session
        .on_connection_event(ConnectionEvent::StateChanged(ConnectionState::Connected))
        .await
        .unwrap();

    assert_eq!(t.session.state(), NegotiationState::Connected);
}

#[tokio::test]
async fn test_malformed_offer_fails() {
    init_tracing();
    let mut t = create_test_session("alice");

    let result = t
        .session
        .on_offer_received(SessionDescription::offer("v=0 malformed"), None)
        .await;

    assert_eq!(
        result,
        Err(ClientError::Negotiation {
            peer: "alice".into(),
            reason: "malformed session description".to_owned(),
        })
    );
    assert!(t.outbound.try_recv().is_err());
}

#[tokio::test]
async fn test_new_offer_restarts_session() {
    init_tracing();
    let mut t = create_test_session("alice");

    t.session
        .on_offer_received(SessionDescription::offer("v=0 first"), None)
        .await
        .unwrap();
    t.session
        .on_offer_received(SessionDescription::offer("v=0 second"), None)
        .await
        .unwrap();

    assert_eq!(t.session.state(), NegotiationState::AnswerSent);
    assert_eq!(t.factory.connection_count().await, 2);
    assert!(t.factory.is_closed(0).await);
    assert!(!t.factory.is_closed(1).await);
}
