use tether_core::{ClientMessage, RelayMessage, ServerMessage, SessionDescription, Signal};
use tether_server::RelayCommand;

use crate::integration::{init_tracing, spawn_test_relay};
use crate::utils::wait_for_frame;

#[tokio::test]
async fn test_commands_are_applied_in_arrival_order() {
    init_tracing();

    let (cmd_tx, mut signal_rx, signaling) = spawn_test_relay();
    let alice = signaling.open().await;
    let bob = signaling.open().await;

    let commands = vec![
        RelayCommand::from_client(
            alice,
            ClientMessage::Register {
                user_id: "alice".into(),
                user_name: "Alice".into(),
            },
        ),
        RelayCommand::from_client(
            bob,
            ClientMessage::Register {
                user_id: "bob".into(),
                user_name: "Bob".into(),
            },
        ),
        RelayCommand::from_client(
            alice,
            ClientMessage::JoinRoom {
                user_id: "alice".into(),
                room_id: "lobby".into(),
            },
        ),
        RelayCommand::from_client(
            bob,
            ClientMessage::JoinRoom {
                user_id: "bob".into(),
                room_id: "lobby".into(),
            },
        ),
        RelayCommand::from_client(
            alice,
            ClientMessage::Message(RelayMessage::new(
                "bob".into(),
                Signal::Offer {
                    offer: SessionDescription::offer("v=0"),
                    mode: None,
                },
            )),
        ),
    ];
    for cmd in commands {
        cmd_tx.send(cmd).await.unwrap();
    }

    let joined = wait_for_frame(&mut signal_rx, &alice, |msg| {
        matches!(msg, ServerMessage::UserJoined { .. })
    })
    .await
    .expect("alice never saw bob join");
    assert_eq!(
        joined,
        ServerMessage::UserJoined {
            user_id: "bob".into()
        }
    );

    let offer = wait_for_frame(&mut signal_rx, &bob, |msg| {
        matches!(msg, ServerMessage::Message(_))
    })
    .await
    .expect("bob never got the offer");
    let ServerMessage::Message(relayed) = offer else {
        unreachable!();
    };
    assert_eq!(relayed.sender_id.as_ref().map(|id| id.as_str()), Some("alice"));

    cmd_tx
        .send(RelayCommand::Disconnect { connection: bob })
        .await
        .unwrap();
    let left = wait_for_frame(&mut signal_rx, &alice, |msg| {
        matches!(msg, ServerMessage::UserLeft { .. })
    })
    .await
    .expect("alice never saw bob leave");
    assert_eq!(
        left,
        ServerMessage::UserLeft {
            user_id: "bob".into()
        }
    );
}
