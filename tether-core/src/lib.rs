pub mod error;
pub mod model;
pub mod traits;
pub mod utils;

pub use error::ProtocolError;
pub use model::*;
pub use traits::WireMessage;
