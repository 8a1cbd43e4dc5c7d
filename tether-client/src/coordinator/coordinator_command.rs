use crate::error::ClientError;
use tether_core::{CallMode, RoomId};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum CoordinatorCommand {
    Call {
        room: RoomId,
        mode: CallMode,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    HangUp {
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
}
