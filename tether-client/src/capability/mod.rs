//! Seams to the platform: local capture devices and the peer transport.

mod connection;
mod media;

pub use connection::*;
pub use media::*;
