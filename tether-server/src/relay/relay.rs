use crate::presence::PresenceRegistry;
use crate::relay::{DropReason, RelayCommand, RouteOutcome};
use crate::room::RoomRouter;
use crate::signaling::{ConnectionId, SignalingOutput};
use std::sync::Arc;
use tether_core::{RelayMessage, RoomId, ServerMessage, UserId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Single owner of the presence registry and the room table.
///
/// Every socket funnels its frames into `command_rx`, so registry and room
/// mutations are applied one at a time in arrival order.
pub struct Relay {
    registry: PresenceRegistry,
    rooms: RoomRouter,
    command_rx: mpsc::Receiver<RelayCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Relay {
    pub fn new(
        command_rx: mpsc::Receiver<RelayCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            registry: PresenceRegistry::new(),
            rooms: RoomRouter::new(),
            command_rx,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!("Relay event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Relay event loop finished");
    }

    pub async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Register {
                connection,
                user_id,
                user_name,
            } => self.register(connection, user_id, user_name).await,

            RelayCommand::JoinRoom {
                connection,
                user_id,
                room_id,
            } => self.join_room(connection, user_id, room_id).await,

            RelayCommand::LeaveRoom {
                connection,
                user_id,
                room_id,
            } => self.leave_room(connection, user_id, room_id).await,

            RelayCommand::Message {
                connection,
                message,
            } => {
                let kind = message.signal.kind();
                if let RouteOutcome::Dropped(reason) = self.route(connection, message).await {
                    warn!("Dropped {} from {}: {:?}", kind, connection, reason);
                }
            }

            RelayCommand::Disconnect { connection } => self.disconnect(connection).await,
        }
    }

    pub fn registry(&self) -> &PresenceRegistry {
        &self.registry
    }

    pub fn rooms(&self) -> &RoomRouter {
        &self.rooms
    }

    pub async fn register(&mut self, connection: ConnectionId, user_id: UserId, user_name: String) {
        info!("Registering {} ({}) on {}", user_id, user_name, connection);

        let registration = self
            .registry
            .register(user_id.clone(), user_name, connection);

        if let Some(old) = registration.rebound_from {
            info!("{} moved from connection {} to {}", user_id, old, connection);
        }
        if let Some(released) = registration.released {
            info!("{} re-registered as {}, releasing old id", released, user_id);
            self.depart(&released).await;
        }

        self.broadcast_presence().await;
    }

    pub async fn join_room(&mut self, connection: ConnectionId, user_id: UserId, room_id: RoomId) {
        if !self.owns(connection, &user_id) {
            warn!("Rejected join of {} to {} from {}", user_id, room_id, connection);
            return;
        }

        let mut existing = self.rooms.join(room_id.clone(), user_id.clone());
        existing.sort();
        info!("{} joined {} ({} already there)", user_id, room_id, existing.len());

        self.signaling
            .send(
                &connection,
                ServerMessage::ExistingUsers {
                    users: existing.clone(),
                },
            )
            .await;

        for member in &existing {
            self.send_to_user(member, ServerMessage::UserJoined {
                user_id: user_id.clone(),
            })
            .await;
        }
    }

    pub async fn leave_room(&mut self, connection: ConnectionId, user_id: UserId, room_id: RoomId) {
        if !self.owns(connection, &user_id) {
            warn!("Rejected leave of {} from {} by {}", user_id, room_id, connection);
            return;
        }

        if self.rooms.leave(&room_id, &user_id) {
            info!("{} left {}", user_id, room_id);
            self.notify_room(&room_id, ServerMessage::UserLeft { user_id })
                .await;
        } else {
            debug!("{} was not in {}", user_id, room_id);
        }
    }

    /// Forwards `message` to whoever currently holds `remote_user_id`.
    ///
    /// `sender_id` is always overwritten with the sender's registered id.
    pub async fn route(&mut self, connection: ConnectionId, mut message: RelayMessage) -> RouteOutcome {
        let Some(sender) = self.registry.identity_of(&connection) else {
            return RouteOutcome::Dropped(DropReason::UnregisteredSender);
        };
        let sender_id = sender.id.clone();

        let Some(to) = self.registry.resolve(&message.remote_user_id) else {
            return RouteOutcome::Dropped(DropReason::UnknownRecipient(
                message.remote_user_id,
            ));
        };

        debug!(
            "Relaying {} {} -> {}",
            message.signal.kind(),
            sender_id,
            message.remote_user_id
        );
        message.sender_id = Some(sender_id);

        if self.signaling.send(&to, ServerMessage::Message(message)).await {
            RouteOutcome::Delivered { to }
        } else {
            RouteOutcome::Dropped(DropReason::ConnectionGone(to))
        }
    }

    pub async fn disconnect(&mut self, connection: ConnectionId) {
        let Some(user_id) = self.registry.unregister(&connection) else {
            debug!("Connection {} closed without a live identity", connection);
            return;
        };

        info!("{} disconnected", user_id);
        self.depart(&user_id).await;
        self.broadcast_presence().await;
    }

    fn owns(&self, connection: ConnectionId, user_id: &UserId) -> bool {
        self.registry
            .identity_of(&connection)
            .is_some_and(|identity| identity.id == *user_id)
    }

    /// Removes `user_id` from every room it is in and tells the remaining members.
    async fn depart(&mut self, user_id: &UserId) {
        for room_id in self.rooms.rooms_of(user_id) {
            if self.rooms.leave(&room_id, user_id) {
                self.notify_room(
                    &room_id,
                    ServerMessage::UserLeft {
                        user_id: user_id.clone(),
                    },
                )
                .await;
            }
        }
    }

    async fn notify_room(&self, room_id: &RoomId, msg: ServerMessage) {
        for member in self.rooms.members_of(room_id) {
            self.send_to_user(&member, msg.clone()).await;
        }
    }

    async fn send_to_user(&self, user_id: &UserId, msg: ServerMessage) {
        match self.registry.resolve(user_id) {
            Some(connection) => {
                self.signaling.send(&connection, msg).await;
            }
            None => debug!("{} is in a room but not registered", user_id),
        }
    }

    async fn broadcast_presence(&self) {
        self.signaling
            .broadcast(ServerMessage::UsersUpdated(self.registry.snapshot()))
            .await;
    }
}
