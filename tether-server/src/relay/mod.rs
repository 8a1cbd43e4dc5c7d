mod relay;
mod relay_command;
mod route;

pub use relay::*;
pub use relay_command::*;
pub use route::*;
