use crate::capability::{ConnectionEvent, ConnectionFactory, MediaTrack};
use crate::engine::{NegotiationSession, NegotiationState, SessionEvent};
use crate::error::ClientError;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{ClientMessage, IceServerConfig, UserId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// What a session actor tells its owner.
#[derive(Debug)]
pub enum SessionUpdate {
    Connected,
    RemoteTrack(MediaTrack),
    /// A fresh offer replaced the connection; earlier remote tracks are gone.
    Restarted,
    /// The session tore itself down and its task has exited.
    Failed(ClientError),
}

#[derive(Debug)]
pub struct SessionReport {
    pub peer: UserId,
    /// Distinguishes a restarted session from the one it replaced.
    pub generation: u64,
    pub update: SessionUpdate,
}

/// Everything a new session needs from its owner.
#[derive(Clone)]
pub struct SessionContext {
    pub factory: Arc<dyn ConnectionFactory>,
    pub ice_servers: Vec<IceServerConfig>,
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub reports: mpsc::UnboundedSender<SessionReport>,
    pub negotiation_timeout: Duration,
}

pub struct SessionHandle {
    peer: UserId,
    generation: u64,
    events: mpsc::UnboundedSender<SessionEvent>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn peer(&self) -> &UserId {
        &self.peer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queues `event`; false once the actor has exited.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Tears the session down and waits for its task to finish.
    pub async fn shutdown(self) {
        let _ = self.events.send(SessionEvent::Shutdown);
        if let Err(e) = self.task.await {
            warn!("Session task for {} ended abnormally: {}", self.peer, e);
        }
    }
}

/// Drives one [`NegotiationSession`] from its own event queue.
pub struct SessionActor {
    session: NegotiationSession,
    generation: u64,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    connection_rx: mpsc::Receiver<ConnectionEvent>,
    reports: mpsc::UnboundedSender<SessionReport>,
    timeout: Duration,
}

impl SessionActor {
    pub fn spawn(peer: UserId, generation: u64, ctx: SessionContext) -> SessionHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (connection_tx, connection_rx) = mpsc::channel(256);

        let session = NegotiationSession::new(
            peer.clone(),
            ctx.factory,
            ctx.ice_servers,
            connection_tx,
            ctx.outbound,
        );
        let actor = SessionActor {
            session,
            generation,
            events_rx,
            connection_rx,
            reports: ctx.reports,
            timeout: ctx.negotiation_timeout,
        };

        let task = tokio::spawn(async move {
            actor.run().await;
        });

        SessionHandle {
            peer,
            generation,
            events: events_tx,
            task,
        }
    }

    pub async fn run(mut self) {
        debug!("Session actor for {} started", self.session.remote_id());

        // Armed while the session waits on its peer.
        let mut deadline = Some(Instant::now() + self.timeout);

        loop {
            let before = self.session.state();
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + self.timeout);

            let result = tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(SessionEvent::Shutdown) | None => break,
                        Some(e) => self.handle_event(e).await,
                    }
                }

                Some(event) = self.connection_rx.recv() => {
                    self.handle_connection_event(event).await
                }

                _ = sleep_until(wake_at), if deadline.is_some() => {
                    Err(ClientError::NegotiationTimeout {
                        peer: self.session.remote_id().clone(),
                    })
                }
            };

            if let Err(error) = result {
                warn!("{}", error);
                self.session.teardown().await;
                self.report(SessionUpdate::Failed(error));
                return;
            }

            let after = self.session.state();
            if after != before {
                debug!("{}: {} -> {}", self.session.remote_id(), before, after);
                if after == NegotiationState::Connected {
                    self.report(SessionUpdate::Connected);
                }
                deadline = after
                    .awaits_peer()
                    .then(|| Instant::now() + self.timeout);
            }
        }

        self.session.teardown().await;
        info!("Session actor for {} finished", self.session.remote_id());
    }

    async fn handle_event(&mut self, event: SessionEvent) -> Result<(), ClientError> {
        match event {
            SessionEvent::Call { mode, local } => {
                self.session.start_as_caller(mode, local.as_ref()).await
            }
            SessionEvent::Offer { offer, local } => {
                let state = self.session.state();
                if state != NegotiationState::Idle && !state.is_closed() {
                    self.report(SessionUpdate::Restarted);
                }
                self.session.on_offer_received(offer, local.as_ref()).await
            }
            SessionEvent::Answer(answer) => self.session.on_answer_received(answer).await,
            SessionEvent::Candidate(candidate) => {
                self.session.on_candidate_received(candidate).await
            }
            SessionEvent::Shutdown => Ok(()),
        }
    }

    async fn handle_connection_event(&mut self, event: ConnectionEvent) -> Result<(), ClientError> {
        if let Some(track) = self.session.on_connection_event(event).await? {
            self.report(SessionUpdate::RemoteTrack(track));
        }
        Ok(())
    }

    fn report(&self, update: SessionUpdate) {
        let report = SessionReport {
            peer: self.session.remote_id().clone(),
            generation: self.generation,
            update,
        };
        if self.reports.send(report).is_err() {
            debug!("Coordinator gone, dropping session report");
        }
    }
}
