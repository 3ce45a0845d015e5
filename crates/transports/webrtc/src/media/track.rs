//! Outbound track sink bound to its peer connection

use super::MediaSink;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_local::TrackLocalWriter;

/// Per-binding write failures that mean the transport underneath is gone.
///
/// The track folds binding errors into one text error, so closure has to be
/// recognized from the message.
const CLOSED_MARKERS: [&str; 5] = [
    "buffer: closed",
    "already closed",
    "has been closed",
    "closed network connection",
    "closed pipe",
];

/// Writes RTP into a [`TrackLocalStaticRTP`] and reports
/// [`Error::SinkClosed`] once the owning connection is closed.
///
/// A closed connection unbinds the track, after which the track itself
/// accepts writes into nothing, so closure is read from the connection.
pub struct TrackSink {
    track: Arc<TrackLocalStaticRTP>,
    connection: Weak<RTCPeerConnection>,
}

impl TrackSink {
    pub fn new(track: Arc<TrackLocalStaticRTP>, connection: &Arc<RTCPeerConnection>) -> Self {
        Self {
            track,
            connection: Arc::downgrade(connection),
        }
    }

    pub fn track(&self) -> &Arc<TrackLocalStaticRTP> {
        &self.track
    }

    fn is_closed(&self) -> bool {
        match self.connection.upgrade() {
            Some(pc) => pc.connection_state() == RTCPeerConnectionState::Closed,
            None => true,
        }
    }
}

#[async_trait]
impl MediaSink for TrackSink {
    async fn write(&self, packet: &[u8]) -> Result<usize> {
        if self.is_closed() {
            return Err(Error::SinkClosed);
        }

        match TrackLocalWriter::write(self.track.as_ref(), packet).await {
            Ok(n) => Ok(n),
            Err(e) if is_closed_error(&e) || self.is_closed() => Err(Error::SinkClosed),
            Err(e) => Err(Error::SinkFault(e.to_string())),
        }
    }
}

fn is_closed_error(err: &webrtc::Error) -> bool {
    match err {
        webrtc::Error::ErrClosedPipe => true,
        other => {
            let text = other.to_string();
            CLOSED_MARKERS.iter().any(|marker| text.contains(marker))
        }
    }
}
