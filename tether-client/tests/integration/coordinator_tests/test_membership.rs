use crate::integration::init_tracing;
use crate::utils::{
    MockConnectionFactory, MockMediaProvider, spawn_peer_set, wait_for_event, wait_until,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tether_client::capability::RemoteMedia;
use tether_client::PeerSetEvent;
use tether_core::{CallMode, PresenceEntry, RoomId, ServerMessage, UserId};

const TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::test]
async fn test_presence_snapshot_is_published() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);
    let mut presence = peers.presence();

    relay.deliver(ServerMessage::UsersUpdated(vec![
        PresenceEntry {
            id: "alice".into(),
            name: "Alice".to_owned(),
        },
        PresenceEntry {
            id: "bob".into(),
            name: "Bob".to_owned(),
        },
    ]));

    wait_until(&mut presence, |users| users.len() == 2).await;
    assert_eq!(presence.borrow()[1].name, "Bob");
}

#[tokio::test]
async fn test_user_left_removes_peer() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);
    let mut events = peers.subscribe();
    let mut remote_media = peers.remote_media();

    peers
        .call(RoomId::new("room-1"), CallMode::Video)
        .await
        .unwrap();
    relay.deliver(ServerMessage::UserJoined {
        user_id: "bob".into(),
    });
    relay.next_signal("bob", "offer").await;
    relay.answer_from("bob", "v=0 bob");
    wait_until(&mut remote_media, |media| media.contains_key("bob")).await;

    relay.deliver(ServerMessage::UserLeft {
        user_id: "bob".into(),
    });

    let event = wait_for_event(&mut events, |e| matches!(e, PeerSetEvent::PeerLeft { .. })).await;
    assert_eq!(event, PeerSetEvent::PeerLeft { peer: "bob".into() });
    assert!(!remote_media.borrow().contains_key("bob"));
    assert!(factory.is_closed(0).await);
}

#[tokio::test]
async fn test_rejoining_peer_gets_fresh_session() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);

    peers
        .call(RoomId::new("room-1"), CallMode::Video)
        .await
        .unwrap();
    for _ in 0..2 {
        relay.deliver(ServerMessage::UserJoined {
            user_id: "bob".into(),
        });
        relay.next_signal("bob", "offer").await;
    }

    assert_eq!(factory.connection_count().await, 2);
    assert!(factory.is_closed(0).await);
    assert!(!factory.is_closed(1).await);
    assert_eq!(media.acquired().await.len(), 1);
}

#[tokio::test]
async fn test_signaling_loss_tears_everything_down() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);
    let mut events = peers.subscribe();

    peers
        .call(RoomId::new("room-1"), CallMode::Video)
        .await
        .unwrap();
    relay.deliver(ServerMessage::UserJoined {
        user_id: "bob".into(),
    });
    relay.next_signal("bob", "offer").await;

    relay.hang_up_socket();

    let event = wait_for_event(&mut events, |e| *e == PeerSetEvent::SignalingLost).await;
    assert_eq!(event, PeerSetEvent::SignalingLost);
    assert!(factory.is_closed(0).await);
    assert_eq!(media.released().await, vec!["local-1"]);
    assert!(peers.local_media().borrow().is_none());

    let result = peers.call(RoomId::new("room-1"), CallMode::Video).await;
    assert_eq!(result, Err(tether_client::ClientError::TransportDisconnected));
}

fn track_ids(media: &BTreeMap<UserId, RemoteMedia>, peer: &str) -> Vec<String> {
    media
        .get(peer)
        .map(|m| m.tracks.iter().map(|t| t.id.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_rejoining_peer_replaces_remote_media() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);
    let mut remote_media = peers.remote_media();

    peers
        .call(RoomId::new("room-1"), CallMode::Video)
        .await
        .unwrap();

    for _ in 0..2 {
        relay.deliver(ServerMessage::UserJoined {
            user_id: "bob".into(),
        });
        relay.next_signal("bob", "offer").await;
        relay.answer_from("bob", "v=0 bob");
    }

    wait_until(&mut remote_media, |media| {
        track_ids(media, "bob").contains(&"remote-audio-1".to_owned())
    })
    .await;

    assert!(factory.is_closed(0).await);
    assert_eq!(track_ids(&remote_media.borrow(), "bob"), vec!["remote-audio-1"]);
}

#[tokio::test]
async fn test_repeated_offer_replaces_remote_media() {
    init_tracing();
    let media = MockMediaProvider::new();
    let factory = MockConnectionFactory::new();
    let (peers, mut relay) = spawn_peer_set("alice", &media, &factory, TIMEOUT);
    let mut remote_media = peers.remote_media();

    relay.offer_from("bob", "v=0 bob");
    relay.next_signal("bob", "answer").await;
    wait_until(&mut remote_media, |media| {
        track_ids(media, "bob") == vec!["remote-audio-0".to_owned()]
    })
    .await;

    relay.offer_from("bob", "v=0 bob again");
    relay.next_signal("bob", "answer").await;
    wait_until(&mut remote_media, |media| {
        track_ids(media, "bob").contains(&"remote-audio-1".to_owned())
    })
    .await;

    assert!(factory.is_closed(0).await);
    assert_eq!(track_ids(&remote_media.borrow(), "bob"), vec!["remote-audio-1"]);
}
