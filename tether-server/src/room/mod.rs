mod room;
mod room_router;

pub use room::*;
pub use room_router::*;
