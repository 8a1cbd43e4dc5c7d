mod media;
mod room;
mod signaling;
mod user;

pub use media::{CallMode, MediaConstraints};
pub use room::RoomId;
pub use signaling::{
    ClientMessage, IceCandidate, IceServerConfig, RelayMessage, SdpKind, ServerMessage,
    SessionDescription, Signal,
};
pub use user::{PresenceEntry, UserId};
