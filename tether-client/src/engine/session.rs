use crate::capability::{
    ConnectionEvent, ConnectionFactory, ConnectionState, LocalStream, MediaTrack, PeerConnection,
};
use crate::engine::NegotiationState;
use crate::error::ClientError;
use std::collections::VecDeque;
use std::sync::Arc;
use tether_core::{
    CallMode, ClientMessage, IceCandidate, IceServerConfig, RelayMessage, SessionDescription,
    Signal, UserId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Offer/answer exchange with one remote peer.
///
/// Candidates that arrive before the remote description is known are queued
/// and applied in arrival order as soon as it is set.
pub struct NegotiationSession {
    remote_id: UserId,
    state: NegotiationState,
    connection: Option<Box<dyn PeerConnection>>,
    pending_candidates: VecDeque<IceCandidate>,
    remote_description_set: bool,
    factory: Arc<dyn ConnectionFactory>,
    ice_servers: Vec<IceServerConfig>,
    connection_events: mpsc::Sender<ConnectionEvent>,
    outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl NegotiationSession {
    pub fn new(
        remote_id: UserId,
        factory: Arc<dyn ConnectionFactory>,
        ice_servers: Vec<IceServerConfig>,
        connection_events: mpsc::Sender<ConnectionEvent>,
        outbound: mpsc::UnboundedSender<ClientMessage>,
    ) -> Self {
        Self {
            remote_id,
            state: NegotiationState::Idle,
            connection: None,
            pending_candidates: VecDeque::new(),
            remote_description_set: false,
            factory,
            ice_servers,
            connection_events,
            outbound,
        }
    }

    pub fn remote_id(&self) -> &UserId {
        &self.remote_id
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn is_remote_description_set(&self) -> bool {
        self.remote_description_set
    }

    pub async fn start_as_caller(
        &mut self,
        mode: CallMode,
        local: Option<&LocalStream>,
    ) -> Result<(), ClientError> {
        if self.state != NegotiationState::Idle {
            return Err(self.fail(format!("cannot start a call from {}", self.state)));
        }
        info!("Calling {} ({:?})", self.remote_id, mode);

        self.ensure_connection(local).await?;

        let offer = self
            .connection()?
            .create_offer()
            .await
            .map_err(|e| self.fail(e))?;
        self.state = NegotiationState::OfferCreated;

        self.connection()?
            .set_local_description(offer.clone())
            .await
            .map_err(|e| self.fail(e))?;

        self.send(Signal::Offer {
            offer,
            mode: Some(mode),
        })?;
        self.state = NegotiationState::OfferSent;
        Ok(())
    }

    /// Answers `offer`. A session that already got past `Idle` is restarted first,
    /// since a fresh offer means the peer started over.
    pub async fn on_offer_received(
        &mut self,
        offer: SessionDescription,
        local: Option<&LocalStream>,
    ) -> Result<(), ClientError> {
        match self.state {
            NegotiationState::Idle => {}
            NegotiationState::Closed => return Err(self.fail("session is closed")),
            state => {
                info!("{} sent a new offer while {}, restarting", self.remote_id, state);
                self.reset().await;
            }
        }

        self.ensure_connection(local).await?;

        self.connection()?
            .set_remote_description(offer)
            .await
            .map_err(|e| self.fail(e))?;
        self.remote_description_set = true;
        self.state = NegotiationState::OfferReceived;

        self.drain_pending_candidates().await?;

        let answer = self
            .connection()?
            .create_answer()
            .await
            .map_err(|e| self.fail(e))?;
        self.state = NegotiationState::AnswerCreated;

        self.connection()?
            .set_local_description(answer.clone())
            .await
            .map_err(|e| self.fail(e))?;

        self.send(Signal::Answer { answer })?;
        self.state = NegotiationState::AnswerSent;
        Ok(())
    }

    pub async fn on_answer_received(&mut self, answer: SessionDescription) -> Result<(), ClientError> {
        if self.state != NegotiationState::OfferSent {
            return Err(self.fail(format!("unexpected answer while {}", self.state)));
        }

        self.connection()?
            .set_remote_description(answer)
            .await
            .map_err(|e| self.fail(e))?;
        self.remote_description_set = true;
        self.state = NegotiationState::AnswerReceived;

        self.drain_pending_candidates().await?;

        info!("Negotiation with {} complete", self.remote_id);
        self.state = NegotiationState::Connected;
        Ok(())
    }

    pub async fn on_candidate_received(&mut self, candidate: IceCandidate) -> Result<(), ClientError> {
        if self.state.is_closed() {
            debug!("Ignoring candidate for closed session {}", self.remote_id);
            return Ok(());
        }

        if !self.remote_description_set {
            debug!("Buffering candidate from {}", self.remote_id);
            self.pending_candidates.push_back(candidate);
            return Ok(());
        }

        self.connection()?
            .add_ice_candidate(candidate)
            .await
            .map_err(|e| self.fail(e))
    }

    /// Returns the track when the event delivered remote media.
    pub async fn on_connection_event(
        &mut self,
        event: ConnectionEvent,
    ) -> Result<Option<MediaTrack>, ClientError> {
        if self.state.is_closed() {
            return Ok(None);
        }

        match event {
            ConnectionEvent::LocalCandidate(candidate) => {
                self.send(Signal::Candidate { candidate })?;
                Ok(None)
            }

            ConnectionEvent::RemoteTrack(track) => {
                debug!("Remote {:?} track {} from {}", track.kind, track.id, self.remote_id);
                Ok(Some(track))
            }

            ConnectionEvent::StateChanged(ConnectionState::Connected) => {
                if self.state == NegotiationState::AnswerSent {
                    info!("Connected to {}", self.remote_id);
                    self.state = NegotiationState::Connected;
                }
                Ok(None)
            }

            ConnectionEvent::StateChanged(ConnectionState::Failed) => {
                Err(self.fail("transport reported permanent failure"))
            }

            ConnectionEvent::StateChanged(state) => {
                debug!("Connection to {} is {:?}", self.remote_id, state);
                Ok(None)
            }
        }
    }

    /// Closes the connection and drops buffered candidates. Safe to call repeatedly.
    pub async fn teardown(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.reset().await;
        self.state = NegotiationState::Closed;
        info!("Session with {} closed", self.remote_id);
    }

    async fn reset(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                warn!("Failed to close connection to {}: {:?}", self.remote_id, e);
            }
        }
        self.pending_candidates.clear();
        self.remote_description_set = false;
        self.state = NegotiationState::Idle;
    }

    async fn ensure_connection(&mut self, local: Option<&LocalStream>) -> Result<(), ClientError> {
        if self.connection.is_some() {
            return Ok(());
        }

        let connection = self
            .factory
            .create_connection(&self.ice_servers, self.connection_events.clone())
            .await
            .map_err(|e| self.fail(e))?;

        if let Some(stream) = local {
            connection
                .add_local_stream(stream)
                .await
                .map_err(|e| self.fail(e))?;
        }

        self.connection = Some(connection);
        Ok(())
    }

    async fn drain_pending_candidates(&mut self) -> Result<(), ClientError> {
        if !self.pending_candidates.is_empty() {
            debug!(
                "Applying {} buffered candidates from {}",
                self.pending_candidates.len(),
                self.remote_id
            );
        }

        while let Some(candidate) = self.pending_candidates.pop_front() {
            self.connection()?
                .add_ice_candidate(candidate)
                .await
                .map_err(|e| self.fail(e))?;
        }
        Ok(())
    }

    fn connection(&self) -> Result<&dyn PeerConnection, ClientError> {
        self.connection
            .as_deref()
            .ok_or_else(|| self.fail("no underlying connection"))
    }

    fn send(&self, signal: Signal) -> Result<(), ClientError> {
        let message = ClientMessage::Message(RelayMessage::new(self.remote_id.clone(), signal));
        self.outbound
            .send(message)
            .map_err(|_| ClientError::TransportDisconnected)
    }

    fn fail(&self, reason: impl ToString) -> ClientError {
        ClientError::negotiation(&self.remote_id, reason)
    }
}
