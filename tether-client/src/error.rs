use tether_core::UserId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("local media unavailable: {0}")]
    MediaUnavailable(String),

    #[error("negotiation with {peer} failed: {reason}")]
    Negotiation { peer: UserId, reason: String },

    #[error("negotiation with {peer} timed out")]
    NegotiationTimeout { peer: UserId },

    #[error("signaling channel disconnected")]
    TransportDisconnected,

    #[error("signaling connection failed: {0}")]
    Signaling(String),
}

impl ClientError {
    pub fn negotiation(peer: &UserId, reason: impl ToString) -> Self {
        Self::Negotiation {
            peer: peer.clone(),
            reason: reason.to_string(),
        }
    }
}
