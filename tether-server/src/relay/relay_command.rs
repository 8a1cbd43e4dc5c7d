use crate::signaling::ConnectionId;
use tether_core::{ClientMessage, RelayMessage, RoomId, UserId};

/// Everything the relay reacts to, in the order the sockets delivered it.
#[derive(Debug)]
pub enum RelayCommand {
    Register {
        connection: ConnectionId,
        user_id: UserId,
        user_name: String,
    },

    JoinRoom {
        connection: ConnectionId,
        user_id: UserId,
        room_id: RoomId,
    },

    LeaveRoom {
        connection: ConnectionId,
        user_id: UserId,
        room_id: RoomId,
    },

    /// Offer/answer/candidate to forward to `message.remote_user_id`.
    Message {
        connection: ConnectionId,
        message: RelayMessage,
    },

    /// The socket closed: implicit unregister and leave of every room.
    Disconnect { connection: ConnectionId },
}

impl RelayCommand {
    pub fn from_client(connection: ConnectionId, msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::Register { user_id, user_name } => RelayCommand::Register {
                connection,
                user_id,
                user_name,
            },
            ClientMessage::JoinRoom { user_id, room_id } => RelayCommand::JoinRoom {
                connection,
                user_id,
                room_id,
            },
            ClientMessage::LeaveRoom { user_id, room_id } => RelayCommand::LeaveRoom {
                connection,
                user_id,
                room_id,
            },
            ClientMessage::Message(message) => RelayCommand::Message {
                connection,
                message,
            },
        }
    }
}
