//! Client side of tether: one negotiation session per remote peer, fanned out
//! over a room by the peer set coordinator.

pub mod backend;
pub mod capability;
mod client;
mod config;
pub mod coordinator;
pub mod engine;
mod error;
pub mod signaling;

pub use client::TetherClient;
pub use config::{ClientConfig, DEFAULT_NEGOTIATION_TIMEOUT};
pub use coordinator::{PeerSet, PeerSetCoordinator, PeerSetEvent};
pub use error::ClientError;
