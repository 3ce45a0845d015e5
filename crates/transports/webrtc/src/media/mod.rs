//! RTP ingest and the outbound media sink
//!
//! Datagrams arrive on a UDP socket, are checked for RTP framing, and are
//! written verbatim into the outbound track.

pub mod ingest;
pub mod rtp;
mod track;

pub use ingest::{IngestStats, MediaIngest};
pub use rtp::validate_rtp;
pub use track::TrackSink;

use crate::Result;
use async_trait::async_trait;

/// Destination for already-framed RTP packets
///
/// `write` reports [`crate::Error::SinkClosed`] once the sink has been shut down;
/// every other failure is [`crate::Error::SinkFault`].
#[async_trait]
pub trait MediaSink: Send + Sync {
    async fn write(&self, packet: &[u8]) -> Result<usize>;
}
