use std::net::SocketAddr;

use tether_core::{
    ClientMessage, IceServerConfig, RelayMessage, ServerMessage, SessionDescription, Signal,
    UserId,
};
use tether_server::{ServerConfig, serve_with_listener};
use tokio::net::TcpListener;

use crate::integration::init_tracing;
use crate::utils::WsClient;

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        bind: addr,
        ice_servers: vec![IceServerConfig::stun("stun:stun.example.org:3478")],
        ..Default::default()
    };

    tokio::spawn(async move {
        serve_with_listener(listener, config).await.unwrap();
    });

    addr
}

async fn connect_and_register(addr: SocketAddr, id: &str) -> WsClient {
    let mut client = WsClient::connect(addr).await.unwrap();

    let first = client.next_event().await.unwrap();
    assert!(matches!(first, ServerMessage::IceConfig { .. }));

    client
        .send(ClientMessage::Register {
            user_id: id.into(),
            user_name: id.to_uppercase(),
        })
        .await
        .unwrap();
    client
}

fn presence_ids(msg: ServerMessage) -> Vec<UserId> {
    match msg {
        ServerMessage::UsersUpdated(users) => users.into_iter().map(|entry| entry.id).collect(),
        other => panic!("expected users-updated, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ice_config_is_sent_on_connect() {
    init_tracing();

    let addr = start_server().await;
    let mut client = WsClient::connect(addr).await.unwrap();

    assert_eq!(
        client.next_event().await.unwrap(),
        ServerMessage::IceConfig {
            ice_servers: vec![IceServerConfig::stun("stun:stun.example.org:3478")],
        }
    );
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_two_clients_negotiate_through_relay() {
    init_tracing();

    let addr = start_server().await;

    let mut alice = connect_and_register(addr, "alice").await;
    assert_eq!(presence_ids(alice.next_event().await.unwrap()), vec![UserId::from("alice")]);

    let mut bob = connect_and_register(addr, "bob").await;
    let expected = vec![UserId::from("alice"), UserId::from("bob")];
    assert_eq!(presence_ids(bob.next_event().await.unwrap()), expected);
    assert_eq!(presence_ids(alice.next_event().await.unwrap()), expected);

    alice
        .send(ClientMessage::JoinRoom {
            user_id: "alice".into(),
            room_id: "lobby".into(),
        })
        .await
        .unwrap();
    assert_eq!(
        alice.next_event().await.unwrap(),
        ServerMessage::ExistingUsers { users: Vec::new() }
    );

    bob.send(ClientMessage::JoinRoom {
        user_id: "bob".into(),
        room_id: "lobby".into(),
    })
    .await
    .unwrap();
    assert_eq!(
        bob.next_event().await.unwrap(),
        ServerMessage::ExistingUsers {
            users: vec!["alice".into()]
        }
    );
    assert_eq!(
        alice.next_event().await.unwrap(),
        ServerMessage::UserJoined {
            user_id: "bob".into()
        }
    );

    bob.send(ClientMessage::Message(RelayMessage::new(
        "alice".into(),
        Signal::Offer {
            offer: SessionDescription::offer("v=0 bob"),
            mode: None,
        },
    )))
    .await
    .unwrap();

    let ServerMessage::Message(relayed) = alice.next_event().await.unwrap() else {
        panic!("expected relayed offer");
    };
    assert_eq!(relayed.sender_id, Some(UserId::from("bob")));
    assert!(matches!(relayed.signal, Signal::Offer { .. }));

    bob.close().await.unwrap();
    assert_eq!(
        alice.next_event().await.unwrap(),
        ServerMessage::UserLeft {
            user_id: "bob".into()
        }
    );
    assert_eq!(presence_ids(alice.next_event().await.unwrap()), vec![UserId::from("alice")]);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    init_tracing();

    let addr = start_server().await;
    let mut alice = WsClient::connect(addr).await.unwrap();
    alice.next_event().await.unwrap();

    alice.send_raw("not json").await.unwrap();
    alice.send_raw(r#"{"event":"shout","data":{}}"#).await.unwrap();
    alice
        .send(ClientMessage::Register {
            user_id: "alice".into(),
            user_name: "Alice".into(),
        })
        .await
        .unwrap();

    assert_eq!(presence_ids(alice.next_event().await.unwrap()), vec![UserId::from("alice")]);
}
