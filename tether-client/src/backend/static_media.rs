use crate::capability::{LocalStream, MediaProvider, MediaTrack, TrackKind};
use crate::error::ClientError;
use async_trait::async_trait;
use std::sync::Arc;
use tether_core::MediaConstraints;
use tracing::{debug, info};
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Media provider that hands out sample-fed Opus/VP8 tracks.
///
/// There is no capture device behind it: whoever owns the stream writes
/// samples into the downcast `TrackLocalStaticSample`s.
#[derive(Debug, Default, Clone)]
pub struct StaticMediaProvider;

impl StaticMediaProvider {
    pub fn new() -> Self {
        Self
    }

    fn track(kind: TrackKind, stream_id: &str) -> MediaTrack {
        let (codec, id) = match kind {
            TrackKind::Audio => (
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48000,
                    channels: 2,
                    ..Default::default()
                },
                format!("audio-{}", stream_id),
            ),
            TrackKind::Video => (
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    clock_rate: 90000,
                    ..Default::default()
                },
                format!("video-{}", stream_id),
            ),
        };

        let track = Arc::new(TrackLocalStaticSample::new(
            codec,
            id.clone(),
            stream_id.to_owned(),
        ));
        MediaTrack::new(id, kind, track)
    }
}

#[async_trait]
impl MediaProvider for StaticMediaProvider {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalStream, ClientError> {
        if !constraints.audio && !constraints.video {
            return Err(ClientError::MediaUnavailable(
                "no audio or video requested".to_owned(),
            ));
        }

        let stream_id = format!("stream-{}", Uuid::new_v4());
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(Self::track(TrackKind::Audio, &stream_id));
        }
        if constraints.video {
            tracks.push(Self::track(TrackKind::Video, &stream_id));
        }

        info!("Created {} static tracks for {}", tracks.len(), stream_id);
        Ok(LocalStream {
            id: stream_id,
            tracks,
        })
    }

    async fn release(&self, stream: &LocalStream) {
        // No device to close; sample tracks go quiet once their writer stops.
        debug!("Released {} ({} tracks)", stream.id, stream.tracks.len());
    }
}
