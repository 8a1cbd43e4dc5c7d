use crate::error::ClientError;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tether_core::{ClientMessage, ServerMessage, WireMessage};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Both directions of a live relay connection.
///
/// Dropping `outbound` closes the socket; `inbound` yields `None` once the relay is gone.
pub struct SignalingChannel {
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

pub struct SignalingClient;

impl SignalingClient {
    pub async fn connect(url: &str) -> Result<SignalingChannel, ClientError> {
        info!("Connecting to signaling server at {}", url);
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::Signaling(format!("{}: {}", url, e)))?;

        let (write, read) = ws_stream.split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::sender_task(write, outbound_rx));
        tokio::spawn(Self::receiver_task(read, inbound_tx));

        Ok(SignalingChannel {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }

    async fn sender_task(
        mut write: SplitSink<WsStream, Message>,
        mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
    ) {
        while let Some(msg) = outbound.recv().await {
            let json = match msg.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signaling message: {}", e);
                    continue;
                }
            };
            if let Err(e) = write.send(Message::text(json)).await {
                warn!("Signaling socket write failed: {}", e);
                break;
            }
        }

        debug!("Outbound signaling closed");
        let _ = write.close().await;
    }

    async fn receiver_task(
        mut read: SplitStream<WsStream>,
        inbound: mpsc::UnboundedSender<ServerMessage>,
    ) {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => match ServerMessage::from_json(text.as_str()) {
                    Ok(msg) => {
                        if inbound.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid frame from relay: {}", e),
                },
                Ok(Message::Close(_)) => {
                    info!("Relay closed the signaling socket");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Signaling socket error: {}", e);
                    break;
                }
            }
        }
    }
}
