use crate::backend::{StaticMediaProvider, WebRtcConnectionFactory};
use crate::capability::{ConnectionFactory, MediaProvider};
use crate::config::ClientConfig;
use crate::coordinator::{PeerSet, PeerSetCoordinator};
use crate::error::ClientError;
use crate::signaling::SignalingClient;
use std::sync::Arc;
use tether_core::{CallMode, ClientMessage, RoomId, UserId};
use tracing::info;

/// A registered relay connection with its peer set coordinator.
pub struct TetherClient {
    config: ClientConfig,
    peers: PeerSet,
}

impl TetherClient {
    /// Connects to the relay, registers `config.user_id` and starts the coordinator.
    pub async fn connect(
        config: ClientConfig,
        media: Arc<dyn MediaProvider>,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<Self, ClientError> {
        let channel = SignalingClient::connect(&config.server_url).await?;

        channel
            .outbound
            .send(ClientMessage::Register {
                user_id: config.user_id.clone(),
                user_name: config.display_name.clone(),
            })
            .map_err(|_| ClientError::TransportDisconnected)?;
        info!("Registered as {} ({})", config.user_id, config.display_name);

        let peers = PeerSetCoordinator::spawn(
            &config,
            media,
            factory,
            channel.outbound,
            channel.inbound,
        );

        Ok(Self { config, peers })
    }

    /// [`TetherClient::connect`] with the webrtc-rs transport and static sample tracks.
    pub async fn connect_webrtc(config: ClientConfig) -> Result<Self, ClientError> {
        Self::connect(
            config,
            Arc::new(StaticMediaProvider::new()),
            Arc::new(WebRtcConnectionFactory::new()),
        )
        .await
    }

    pub fn user_id(&self) -> &UserId {
        &self.config.user_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    pub async fn call(&self, room: RoomId, mode: CallMode) -> Result<(), ClientError> {
        self.peers.call(room, mode).await
    }

    pub async fn hang_up(&self) -> Result<(), ClientError> {
        self.peers.hang_up().await
    }
}
