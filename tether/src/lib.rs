pub use tether_core::{CallMode, RoomId, UserId};

pub mod model {
    pub use tether_core::model::*;
    pub use tether_core::{ProtocolError, WireMessage};
}

#[cfg(feature = "server")]
pub mod server {
    pub use tether_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use tether_client::*;
}
