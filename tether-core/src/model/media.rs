use serde::{Deserialize, Serialize};

/// Track set a call asks the local media device for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    Audio,
    #[default]
    Video,
}

impl CallMode {
    pub fn constraints(self) -> MediaConstraints {
        MediaConstraints {
            audio: true,
            video: self == CallMode::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}
