use crate::signaling::ConnectionId;
use tether_core::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered { to: ConnectionId },
    Dropped(DropReason),
}

/// Why a message was not forwarded. Never reported back to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    UnknownRecipient(UserId),
    UnregisteredSender,
    ConnectionGone(ConnectionId),
}

impl RouteOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, RouteOutcome::Delivered { .. })
    }
}
