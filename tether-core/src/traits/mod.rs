mod message;

pub use message::WireMessage;
