use crate::signaling::ConnectionId;
use async_trait::async_trait;
use tether_core::ServerMessage;

/// Outbound side of the signaling transport, as seen by the relay.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Single delivery attempt; `false` when the connection is already gone.
    async fn send(&self, connection: &ConnectionId, msg: ServerMessage) -> bool;

    /// Deliver to every currently connected session.
    async fn broadcast(&self, msg: ServerMessage);
}
