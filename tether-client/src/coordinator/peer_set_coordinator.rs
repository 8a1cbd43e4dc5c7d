use crate::capability::{ConnectionFactory, LocalStream, MediaProvider, RemoteMedia};
use crate::config::ClientConfig;
use crate::coordinator::{CoordinatorCommand, PeerSet, PeerSetEvent};
use crate::engine::{
    SessionActor, SessionContext, SessionEvent, SessionHandle, SessionReport, SessionUpdate,
};
use crate::error::ClientError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tether_core::{
    CallMode, ClientMessage, PresenceEntry, RelayMessage, RoomId, ServerMessage, Signal, UserId,
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

/// Owns one negotiation session per remote peer and the shared local stream.
///
/// Runs as a single task: relay events, API commands and session reports are
/// handled one at a time, so the session table has exactly one writer.
pub struct PeerSetCoordinator {
    local_id: UserId,
    mode: CallMode,
    room: Option<RoomId>,
    local_stream: Option<LocalStream>,
    sessions: HashMap<UserId, SessionHandle>,
    next_generation: u64,
    media: Arc<dyn MediaProvider>,
    ctx: SessionContext,
    signaling_open: bool,

    commands: mpsc::Receiver<CoordinatorCommand>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    reports_rx: mpsc::UnboundedReceiver<SessionReport>,

    local_media: watch::Sender<Option<LocalStream>>,
    remote_media: watch::Sender<BTreeMap<UserId, RemoteMedia>>,
    presence: watch::Sender<Vec<PresenceEntry>>,
    events: broadcast::Sender<PeerSetEvent>,
}

impl PeerSetCoordinator {
    /// Starts the coordinator on its own task.
    ///
    /// `outbound` and `inbound` are the two halves of the signaling channel; the
    /// coordinator treats `inbound` closing as losing the relay.
    pub fn spawn(
        config: &ClientConfig,
        media: Arc<dyn MediaProvider>,
        factory: Arc<dyn ConnectionFactory>,
        outbound: mpsc::UnboundedSender<ClientMessage>,
        inbound: mpsc::UnboundedReceiver<ServerMessage>,
    ) -> PeerSet {
        let (commands_tx, commands) = mpsc::channel(32);
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        let (local_media, local_media_rx) = watch::channel(None);
        let (remote_media, remote_media_rx) = watch::channel(BTreeMap::new());
        let (presence, presence_rx) = watch::channel(Vec::new());
        let (events, _) = broadcast::channel(64);

        let coordinator = PeerSetCoordinator {
            local_id: config.user_id.clone(),
            mode: CallMode::default(),
            room: None,
            local_stream: None,
            sessions: HashMap::new(),
            next_generation: 0,
            media,
            ctx: SessionContext {
                factory,
                ice_servers: config.ice_servers.clone(),
                outbound,
                reports: reports_tx,
                negotiation_timeout: config.negotiation_timeout,
            },
            signaling_open: true,
            commands,
            inbound,
            reports_rx,
            local_media,
            remote_media,
            presence,
            events: events.clone(),
        };

        tokio::spawn(async move {
            coordinator.run().await;
        });

        PeerSet::new(
            config.user_id.clone(),
            commands_tx,
            local_media_rx,
            remote_media_rx,
            presence_rx,
            events,
        )
    }

    pub async fn run(mut self) {
        info!("Peer set coordinator started for {}", self.local_id);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All peer set handles dropped. Shutting down coordinator.");
                            break;
                        }
                    }
                }

                msg = self.inbound.recv(), if self.signaling_open => {
                    match msg {
                        Some(m) => self.handle_server_message(m).await,
                        None => self.on_signaling_lost().await,
                    }
                }

                Some(report) = self.reports_rx.recv() => {
                    self.handle_report(report).await;
                }
            }
        }

        if let Err(e) = self.hang_up().await {
            debug!("Final hang-up incomplete: {}", e);
        }
        info!("Peer set coordinator finished");
    }

    async fn handle_command(&mut self, cmd: CoordinatorCommand) {
        match cmd {
            CoordinatorCommand::Call { room, mode, reply } => {
                let result = self.call(room, mode).await;
                let _ = reply.send(result);
            }
            CoordinatorCommand::HangUp { reply } => {
                let result = self.hang_up().await;
                let _ = reply.send(result);
            }
        }
    }

    async fn call(&mut self, room: RoomId, mode: CallMode) -> Result<(), ClientError> {
        if !self.signaling_open {
            return Err(ClientError::TransportDisconnected);
        }
        if self.room.is_some() {
            self.hang_up().await?;
        }

        let needs_upgrade = self
            .local_stream
            .as_ref()
            .is_some_and(|stream| !stream.satisfies(mode.constraints()));
        if needs_upgrade {
            self.release_local_media().await;
        }

        self.mode = mode;
        self.acquire_local_media(mode).await?;

        info!("Joining room {} ({:?})", room, mode);
        self.send(ClientMessage::JoinRoom {
            user_id: self.local_id.clone(),
            room_id: room.clone(),
        })?;
        self.room = Some(room);
        Ok(())
    }

    async fn hang_up(&mut self) -> Result<(), ClientError> {
        self.close_all_sessions().await;
        self.release_local_media().await;

        let Some(room) = self.room.take() else {
            return Ok(());
        };
        info!("Leaving room {}", room);
        if !self.signaling_open {
            return Ok(());
        }
        self.send(ClientMessage::LeaveRoom {
            user_id: self.local_id.clone(),
            room_id: room,
        })
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::IceConfig { ice_servers } => {
                if !ice_servers.is_empty() {
                    debug!("Relay supplied {} ICE servers", ice_servers.len());
                    self.ctx.ice_servers = ice_servers;
                }
            }

            ServerMessage::UsersUpdated(users) => {
                self.presence.send_replace(users);
            }

            ServerMessage::ExistingUsers { users } => {
                for peer in users {
                    if peer == self.local_id || self.sessions.contains_key(&peer) {
                        continue;
                    }
                    debug!("Waiting for an offer from {}", peer);
                    self.open_session(peer);
                }
            }

            ServerMessage::UserJoined { user_id } => self.on_user_joined(user_id).await,

            ServerMessage::UserLeft { user_id } => self.on_user_left(user_id).await,

            ServerMessage::Message(relay) => self.on_relay_message(relay).await,
        }
    }

    /// The existing member calls the newcomer. Any previous session with it restarts.
    async fn on_user_joined(&mut self, peer: UserId) {
        if peer == self.local_id {
            return;
        }
        if self.room.is_none() {
            debug!("Ignoring user_joined for {} outside a call", peer);
            return;
        }

        let local = match self.acquire_local_media(self.mode).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Cannot call {}: {}", peer, e);
                self.emit(PeerSetEvent::MediaUnavailable {
                    reason: e.to_string(),
                });
                return;
            }
        };

        self.close_session(&peer).await;
        self.remove_remote_media(&peer);
        self.open_session(peer.clone());
        self.dispatch(
            &peer,
            SessionEvent::Call {
                mode: self.mode,
                local: Some(local),
            },
        );
    }

    async fn on_user_left(&mut self, peer: UserId) {
        let had_session = self.close_session(&peer).await;
        self.remove_remote_media(&peer);
        self.release_if_idle().await;
        if had_session {
            self.emit(PeerSetEvent::PeerLeft { peer });
        }
    }

    async fn on_relay_message(&mut self, relay: RelayMessage) {
        let kind = relay.signal.kind();
        let Some(from) = relay.sender_id else {
            warn!("Dropping {} without a sender", kind);
            return;
        };

        match relay.signal {
            Signal::Offer { offer, mode } => {
                let mode = mode.unwrap_or_default();
                if !self.sessions.contains_key(&from) {
                    info!("Incoming {:?} call from {}", mode, from);
                    self.open_session(from.clone());
                    self.emit(PeerSetEvent::IncomingCall {
                        from: from.clone(),
                        mode,
                    });
                }

                let local = match self.acquire_local_media(mode).await {
                    Ok(stream) => stream,
                    Err(e) => {
                        warn!("Declining offer from {}: {}", from, e);
                        self.close_session(&from).await;
                        self.emit(PeerSetEvent::MediaUnavailable {
                            reason: e.to_string(),
                        });
                        return;
                    }
                };

                self.dispatch(
                    &from,
                    SessionEvent::Offer {
                        offer,
                        local: Some(local),
                    },
                );
            }

            signal => {
                let Some(event) = SessionEvent::from_signal(signal) else {
                    return;
                };
                if self.sessions.contains_key(&from) {
                    self.dispatch(&from, event);
                } else {
                    debug!("No session for {}, dropping {}", from, kind);
                }
            }
        }
    }

    async fn handle_report(&mut self, report: SessionReport) {
        let SessionReport {
            peer,
            generation,
            update,
        } = report;

        let current = self
            .sessions
            .get(&peer)
            .is_some_and(|handle| handle.generation() == generation);
        if !current {
            debug!("Dropping report from a replaced session with {}", peer);
            return;
        }

        match update {
            SessionUpdate::Connected => {
                self.emit(PeerSetEvent::PeerConnected { peer });
            }

            SessionUpdate::RemoteTrack(track) => {
                self.remote_media.send_modify(|media| {
                    media
                        .entry(peer.clone())
                        .or_insert_with(|| RemoteMedia::new(peer.clone()))
                        .tracks
                        .push(track);
                });
            }

            SessionUpdate::Restarted => {
                debug!("Session with {} restarted, dropping its remote tracks", peer);
                self.remove_remote_media(&peer);
            }

            SessionUpdate::Failed(error) => {
                self.close_session(&peer).await;
                self.remove_remote_media(&peer);
                self.release_if_idle().await;
                self.emit(PeerSetEvent::PeerFailed { peer, error });
            }
        }
    }

    async fn on_signaling_lost(&mut self) {
        warn!("Signaling channel closed, tearing down {} sessions", self.sessions.len());
        self.signaling_open = false;
        self.close_all_sessions().await;
        self.release_local_media().await;
        self.room = None;
        self.presence.send_replace(Vec::new());
        self.emit(PeerSetEvent::SignalingLost);
    }

    fn open_session(&mut self, peer: UserId) {
        self.next_generation += 1;
        let handle = SessionActor::spawn(peer.clone(), self.next_generation, self.ctx.clone());
        self.sessions.insert(peer, handle);
    }

    /// Returns whether a session existed.
    async fn close_session(&mut self, peer: &UserId) -> bool {
        match self.sessions.remove(peer) {
            Some(handle) => {
                handle.shutdown().await;
                true
            }
            None => false,
        }
    }

    async fn close_all_sessions(&mut self) {
        for (_, handle) in self.sessions.drain() {
            handle.shutdown().await;
        }
        self.remote_media.send_replace(BTreeMap::new());
    }

    fn dispatch(&self, peer: &UserId, event: SessionEvent) {
        let Some(handle) = self.sessions.get(peer) else {
            return;
        };
        if !handle.send(event) {
            debug!("Session with {} already exited", peer);
        }
    }

    async fn acquire_local_media(&mut self, mode: CallMode) -> Result<LocalStream, ClientError> {
        if let Some(stream) = &self.local_stream {
            return Ok(stream.clone());
        }

        let stream = self.media.acquire(mode.constraints()).await?;
        info!(
            "Acquired local stream {} with {} tracks",
            stream.id,
            stream.tracks.len()
        );
        self.local_stream = Some(stream.clone());
        self.local_media.send_replace(Some(stream.clone()));
        Ok(stream)
    }

    async fn release_local_media(&mut self) {
        let Some(stream) = self.local_stream.take() else {
            return;
        };
        self.media.release(&stream).await;
        self.local_media.send_replace(None);
        debug!("Released local stream {}", stream.id);
    }

    /// Direct calls taken outside a room keep media only while a session uses it.
    async fn release_if_idle(&mut self) {
        if self.room.is_none() && self.sessions.is_empty() {
            self.release_local_media().await;
        }
    }

    fn remove_remote_media(&self, peer: &UserId) {
        self.remote_media.send_if_modified(|media| media.remove(peer).is_some());
    }

    fn send(&self, msg: ClientMessage) -> Result<(), ClientError> {
        self.ctx
            .outbound
            .send(msg)
            .map_err(|_| ClientError::TransportDisconnected)
    }

    fn emit(&self, event: PeerSetEvent) {
        let _ = self.events.send(event);
    }
}
