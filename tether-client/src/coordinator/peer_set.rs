use crate::capability::{LocalStream, RemoteMedia};
use crate::coordinator::{CoordinatorCommand, PeerSetEvent};
use crate::error::ClientError;
use std::collections::BTreeMap;
use tether_core::{CallMode, PresenceEntry, RoomId, UserId};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Cloneable handle to a running peer set coordinator.
#[derive(Clone)]
pub struct PeerSet {
    local_id: UserId,
    commands: mpsc::Sender<CoordinatorCommand>,
    local_media: watch::Receiver<Option<LocalStream>>,
    remote_media: watch::Receiver<BTreeMap<UserId, RemoteMedia>>,
    presence: watch::Receiver<Vec<PresenceEntry>>,
    events: broadcast::Sender<PeerSetEvent>,
}

impl PeerSet {
    pub(crate) fn new(
        local_id: UserId,
        commands: mpsc::Sender<CoordinatorCommand>,
        local_media: watch::Receiver<Option<LocalStream>>,
        remote_media: watch::Receiver<BTreeMap<UserId, RemoteMedia>>,
        presence: watch::Receiver<Vec<PresenceEntry>>,
        events: broadcast::Sender<PeerSetEvent>,
    ) -> Self {
        Self {
            local_id,
            commands,
            local_media,
            remote_media,
            presence,
            events,
        }
    }

    pub fn local_id(&self) -> &UserId {
        &self.local_id
    }

    /// Acquires local media for `mode` and joins `room`.
    ///
    /// Members already in the room call us; everyone joining later is called by us.
    pub async fn call(&self, room: RoomId, mode: CallMode) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.request(CoordinatorCommand::Call { room, mode, reply }, rx)
            .await
    }

    /// Closes every session, stops local tracks and leaves the room.
    pub async fn hang_up(&self) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.request(CoordinatorCommand::HangUp { reply }, rx).await
    }

    pub fn local_media(&self) -> watch::Receiver<Option<LocalStream>> {
        self.local_media.clone()
    }

    pub fn remote_media(&self) -> watch::Receiver<BTreeMap<UserId, RemoteMedia>> {
        self.remote_media.clone()
    }

    pub fn presence(&self) -> watch::Receiver<Vec<PresenceEntry>> {
        self.presence.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PeerSetEvent> {
        self.events.subscribe()
    }

    async fn request(
        &self,
        cmd: CoordinatorCommand,
        rx: oneshot::Receiver<Result<(), ClientError>>,
    ) -> Result<(), ClientError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| ClientError::TransportDisconnected)?;
        rx.await.map_err(|_| ClientError::TransportDisconnected)?
    }
}
