//! Signaling relay: tracks who is reachable under which identifier and
//! routes negotiation messages between exactly the right connections.

mod app;
mod config;
mod presence;
mod relay;
mod room;
mod signaling;

pub use app::{router, serve, serve_with_listener, spawn_relay};
pub use config::ServerConfig;
pub use presence::*;
pub use relay::*;
pub use room::*;
pub use signaling::*;
