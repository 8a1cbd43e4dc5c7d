mod actor;
mod negotiation_state;
mod session;
mod session_event;

pub use actor::*;
pub use negotiation_state::*;
pub use session::*;
pub use session_event::*;
