mod coordinator_command;
mod peer_set;
mod peer_set_coordinator;
mod peer_set_event;

pub use coordinator_command::*;
pub use peer_set::*;
pub use peer_set_coordinator::*;
pub use peer_set_event::*;
