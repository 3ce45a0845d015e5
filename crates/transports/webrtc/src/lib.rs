//! RTP-over-UDP to WebRTC bridge
//!
//! Accepts one browser offer over an out-of-band line transport, answers it
//! with a fully gathered description, and then relays RTP datagrams arriving
//! on a local UDP socket into the negotiated outbound track.
//!
//! # Example
//!
//! ```ignore
//! use rtpbridge_webrtc::{
//!     media::MediaIngest, peer::WebRtcPeer, session::{PeerSession, SessionOptions},
//!     signaling::LineSignaling, RelayConfig,
//! };
//!
//! let config = RelayConfig::default();
//! let ingest = MediaIngest::from_config(&config).await?;
//! let parts = WebRtcPeer::create(&config).await?;
//!
//! let mut session = PeerSession::from_parts(parts, SessionOptions::from_config(&config));
//! let stats = session.run(&mut LineSignaling::stdio(), ingest).await?;
//! ```

pub mod channels;
pub mod config;
pub mod error;
pub mod media;
pub mod peer;
pub mod session;
pub mod signaling;

pub use config::{RelayConfig, TrackConfig};
pub use error::{Error, Result};
pub use media::{IngestStats, MediaIngest, MediaSink, TrackSink};
pub use peer::{ConnectivityMonitor, ConnectivityState, PeerConnection, WebRtcPeer};
pub use session::{PeerSession, SessionOptions, SessionState};
pub use signaling::{SessionDescription, SignalingChannel};
