use crate::ProtocolError;
use serde::{Serialize, de::DeserializeOwned};

/// A frame that travels over the signaling socket as a JSON text message.
pub trait WireMessage: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}
