use crate::integration::init_tracing;
use crate::utils::{
    MockConnectionFactory, MockMediaProvider, spawn_peer_set, wait_for_event, wait_until,
};
use std::time::Duration;
use tether_client::{ClientError, PeerSetEvent};
use tether_core::{CallMode, ClientMessage, RoomId, Signal, UserId};

const TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::test]
async fn test_call_acquires_media_and_joins_room() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);

    peers
        .call(RoomId::new("room-1"), CallMode::Video)
        .await
        .unwrap();

    assert_eq!(
        relay.next_message().await,
        ClientMessage::JoinRoom {
            user_id: "alice".into(),
            room_id: RoomId::new("room-1"),
        }
    );
    assert_eq!(media.acquired().await, vec![CallMode::Video.constraints()]);

    let local = peers.local_media().borrow().clone().unwrap();
    assert_eq!(local.tracks.len(), 2);
}

#[tokio::test]
async fn test_call_without_media_does_not_join() {
    init_tracing();
    let media = MockMediaProvider::denied();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);

    let result = peers.call(RoomId::new("room-1"), CallMode::Video).await;

    assert!(matches!(result, Err(ClientError::MediaUnavailable(_))));
    assert!(relay.from_client.try_recv().is_err());
    assert!(peers.local_media().borrow().is_none());
}

#[tokio::test]
async fn test_user_joined_gets_offer_and_connects() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);
    let mut events = peers.subscribe();
    let mut remote_media = peers.remote_media();

    peers
        .call(RoomId::new("room-1"), CallMode::Audio)
        .await
        .unwrap();
    relay.deliver(tether_core::ServerMessage::UserJoined {
        user_id: "bob".into(),
    });

    match relay.next_signal("bob", "offer").await {
        Signal::Offer { mode, .. } => assert_eq!(mode, Some(CallMode::Audio)),
        other => panic!("expected offer, got {:?}", other),
    }

    relay.answer_from("bob", "v=0 bob");

    let event = wait_for_event(&mut events, |e| {
        matches!(e, PeerSetEvent::PeerConnected { .. })
    })
    .await;
    assert_eq!(
        event,
        PeerSetEvent::PeerConnected {
            peer: "bob".into()
        }
    );

    wait_until(&mut remote_media, |media| media.contains_key("bob")).await;
    let bob = UserId::from("bob");
    assert_eq!(remote_media.borrow()[&bob].tracks.len(), 1);
}

#[tokio::test]
async fn test_call_in_other_mode_rejoins_with_new_media() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);

    peers
        .call(RoomId::new("room-1"), CallMode::Audio)
        .await
        .unwrap();
    peers
        .call(RoomId::new("room-2"), CallMode::Video)
        .await
        .unwrap();

    assert!(matches!(
        relay.next_message().await,
        ClientMessage::JoinRoom { .. }
    ));
    assert_eq!(
        relay.next_message().await,
        ClientMessage::LeaveRoom {
            user_id: "alice".into(),
            room_id: RoomId::new("room-1"),
        }
    );
    assert_eq!(
        relay.next_message().await,
        ClientMessage::JoinRoom {
            user_id: "alice".into(),
            room_id: RoomId::new("room-2"),
        }
    );

    assert_eq!(
        media.acquired().await,
        vec![CallMode::Audio.constraints(), CallMode::Video.constraints()]
    );
    assert_eq!(media.released().await, vec!["local-1"]);
}

#[tokio::test]
async fn test_hang_up_closes_sessions_and_leaves_room() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);

    peers
        .call(RoomId::new("room-1"), CallMode::Video)
        .await
        .unwrap();
    relay.deliver(tether_core::ServerMessage::UserJoined {
        user_id: "bob".into(),
    });
    relay.next_signal("bob", "offer").await;

    peers.hang_up().await.unwrap();

    loop {
        if let ClientMessage::LeaveRoom { user_id, room_id } = relay.next_message().await {
            assert_eq!(user_id.as_str(), "alice");
            assert_eq!(room_id, RoomId::new("room-1"));
            break;
        }
    }

    assert!(factory.is_closed(0).await);
    assert_eq!(media.released().await, vec!["local-1"]);
    assert!(peers.local_media().borrow().is_none());
    assert!(peers.remote_media().borrow().is_empty());
}
