use crate::error::ClientError;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tether_core::{MediaConstraints, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A media track owned by whichever backend produced it.
///
/// `handle` is the backend's own track object; only that backend downcasts it.
#[derive(Clone)]
pub struct MediaTrack {
    pub id: String,
    pub kind: TrackKind,
    handle: Arc<dyn Any + Send + Sync>,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind, handle: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            id: id.into(),
            kind,
            handle,
        }
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.handle.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Locally captured tracks, attached read-only to every session.
#[derive(Debug, Clone)]
pub struct LocalStream {
    pub id: String,
    pub tracks: Vec<MediaTrack>,
}

impl LocalStream {
    pub fn has(&self, kind: TrackKind) -> bool {
        self.tracks.iter().any(|track| track.kind == kind)
    }

    /// Whether this stream already covers what `constraints` asks for.
    pub fn satisfies(&self, constraints: MediaConstraints) -> bool {
        (!constraints.audio || self.has(TrackKind::Audio))
            && (!constraints.video || self.has(TrackKind::Video))
    }
}

/// Tracks received from one remote peer.
#[derive(Debug, Clone)]
pub struct RemoteMedia {
    pub user_id: UserId,
    pub tracks: Vec<MediaTrack>,
}

impl RemoteMedia {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            tracks: Vec::new(),
        }
    }
}

#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Fails with [`ClientError::MediaUnavailable`] when the device or permission is missing.
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalStream, ClientError>;

    /// Gives back the capture behind `stream`.
    ///
    /// Connections hold their own references to the tracks, so a track stops
    /// sending once every session that attached it has been torn down.
    async fn release(&self, stream: &LocalStream);
}
