//! Default capabilities backed by webrtc-rs.

mod static_media;
mod webrtc_connection;

pub use static_media::*;
pub use webrtc_connection::*;
