use crate::relay::RelayCommand;
use crate::signaling::{ConnectionId, SignalingOutput, SignalingService};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tether_core::{ClientMessage, ServerMessage, WireMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let connection = ConnectionId::new();
    info!("New WebSocket connection: {}", connection);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_connection(connection, tx);
    service
        .send(
            &connection,
            ServerMessage::IceConfig {
                ice_servers: service.ice_servers(),
            },
        )
        .await;

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match ClientMessage::from_json(text.as_str()) {
                        Ok(client_msg) => {
                            debug!("{} -> {:?}", connection, client_msg);
                            let cmd = RelayCommand::from_client(connection, client_msg);
                            if let Err(e) = service.relay_tx.send(cmd).await {
                                error!("Relay died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid signaling frame from {}: {}", connection, e),
                    },
                    Message::Binary(data) => {
                        warn!("Ignoring {} byte binary frame from {}", data.len(), connection)
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_connection(&connection);
    if let Err(e) = service
        .relay_tx
        .send(RelayCommand::Disconnect { connection })
        .await
    {
        error!("Relay died before disconnect of {}: {}", connection, e);
    }
    info!("WebSocket disconnected: {}", connection);
}
