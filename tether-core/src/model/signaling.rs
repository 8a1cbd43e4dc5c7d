use crate::model::media::CallMode;
use crate::model::room::RoomId;
use crate::model::user::{PresenceEntry, UserId};
use crate::traits::WireMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Opaque session description, shaped like the browser's `RTCSessionDescriptionInit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Network-path candidate, shaped like the browser's `RTCIceCandidateInit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
            username_fragment: None,
        }
    }
}

/// Negotiation payload relayed between two peers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Signal {
    Offer {
        offer: SessionDescription,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<CallMode>,
    },
    Answer {
        answer: SessionDescription,
    },
    Candidate {
        candidate: IceCandidate,
    },
}

impl Signal {
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::Offer { .. } => "offer",
            Signal::Answer { .. } => "answer",
            Signal::Candidate { .. } => "candidate",
        }
    }
}

/// Body of the `message` event.
///
/// `remote_user_id` addresses the destination on the way in. `sender_id` is
/// stamped by the relay on the way out and ignored when a client supplies it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    pub remote_user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(flatten)]
    pub signal: Signal,
}

impl RelayMessage {
    pub fn new(remote_user_id: UserId, signal: Signal) -> Self {
        Self {
            remote_user_id,
            sender_id: None,
            signal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    #[serde(rename = "register")]
    Register { user_id: UserId, user_name: String },

    #[serde(rename = "join_room")]
    JoinRoom { user_id: UserId, room_id: RoomId },

    #[serde(rename = "leave_room")]
    LeaveRoom { user_id: UserId, room_id: RoomId },

    #[serde(rename = "message")]
    Message(RelayMessage),
}

impl WireMessage for ClientMessage {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Full presence snapshot, sent on every registry change.
    #[serde(rename = "users-updated")]
    UsersUpdated(Vec<PresenceEntry>),

    #[serde(rename = "user_joined")]
    UserJoined { user_id: UserId },

    #[serde(rename = "user_left")]
    UserLeft { user_id: UserId },

    #[serde(rename = "existing_users")]
    ExistingUsers { users: Vec<UserId> },

    #[serde(rename = "message")]
    Message(RelayMessage),

    /// STUN/TURN servers the relay wants its clients to use.
    #[serde(rename = "ice_config")]
    IceConfig { ice_servers: Vec<IceServerConfig> },
}

impl WireMessage for ServerMessage {}
