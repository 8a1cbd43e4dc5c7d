use crate::error::ClientError;
use tether_core::{CallMode, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerSetEvent {
    /// A peer we had no session with sent an offer.
    IncomingCall { from: UserId, mode: CallMode },
    PeerConnected { peer: UserId },
    PeerLeft { peer: UserId },
    /// Only this peer's session was torn down.
    PeerFailed { peer: UserId, error: ClientError },
    /// Local media could not be acquired for an inbound call.
    MediaUnavailable { reason: String },
    /// The relay connection closed. Every session is gone.
    SignalingLost,
}
