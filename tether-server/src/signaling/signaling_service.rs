use crate::relay::RelayCommand;
use crate::signaling::{ConnectionId, SignalingOutput};
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use tether_core::{IceServerConfig, ServerMessage, WireMessage};
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Holds the write half of every open signaling socket and the relay's inbox.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) relay_tx: mpsc::Sender<RelayCommand>,
}

impl SignalingService {
    pub fn new(relay_tx: mpsc::Sender<RelayCommand>, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                ice_servers,
            }),
            relay_tx,
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn add_connection(&self, connection: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(connection, tx);
    }

    pub fn remove_connection(&self, connection: &ConnectionId) {
        self.inner.connections.remove(connection);
    }

    fn encode(msg: &ServerMessage) -> Option<Message> {
        match msg.to_json() {
            Ok(json) => Some(Message::Text(json.into())),
            Err(e) => {
                error!("Failed to serialize signal message: {}", e);
                None
            }
        }
    }

    fn send_frame(&self, connection: &ConnectionId, msg: &ServerMessage) -> bool {
        let Some(peer) = self.inner.connections.get(connection) else {
            warn!(
                "Attempted to send signal to disconnected session {}",
                connection
            );
            return false;
        };
        let Some(frame) = Self::encode(msg) else {
            return false;
        };
        if let Err(e) = peer.send(frame) {
            error!("Failed to send WS message to {}: {:?}", connection, e);
            return false;
        }
        true
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(&self, connection: &ConnectionId, msg: ServerMessage) -> bool {
        self.send_frame(connection, &msg)
    }

    async fn broadcast(&self, msg: ServerMessage) {
        let Some(frame) = Self::encode(&msg) else {
            return;
        };
        for entry in self.inner.connections.iter() {
            if entry.value().send(frame.clone()).is_err() {
                warn!("Broadcast skipped closed session {}", entry.key());
            }
        }
    }
}
