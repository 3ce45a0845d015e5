//! Bridge configuration
//!
//! [`RelayConfig`] carries everything the bridge needs to build its peer
//! connection and ingest socket. It can be loaded from a TOML file and is
//! validated before use.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default STUN server used when none are configured
pub const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Default UDP endpoint the encoder sends RTP to
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5004";

/// Kernel receive buffer requested for the ingest socket
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 300_000;

/// Capacity of the reusable datagram buffer
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 1600;

/// Scratch buffer used to drain RTCP feedback
pub const DEFAULT_CONTROL_BUFFER_SIZE: usize = 1500;

/// Smallest datagram that can hold a fixed RTP header
pub const RTP_HEADER_LEN: usize = 12;

const ICE_URL_SCHEMES: [&str; 4] = ["stun:", "stuns:", "turn:", "turns:"];

/// Codec capability of the outbound track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// MIME type, e.g. `video/VP8`
    pub mime_type: String,
    /// RTP clock rate in Hz
    pub clock_rate: u32,
    /// Track identifier announced in the SDP
    pub track_id: String,
    /// Stream identifier announced in the SDP
    pub stream_id: String,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            mime_type: "video/VP8".to_string(),
            clock_rate: 90_000,
            track_id: "video".to_string(),
            stream_id: "rtpbridge".to_string(),
        }
    }
}

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// ICE server URLs (STUN/TURN)
    pub ice_servers: Vec<String>,
    /// Local UDP endpoint receiving RTP
    pub listen_addr: SocketAddr,
    /// Kernel receive buffer size for the ingest socket
    pub recv_buffer_size: usize,
    /// Largest datagram accepted without truncation
    pub max_datagram_size: usize,
    /// Scratch buffer for draining RTCP
    pub control_buffer_size: usize,
    /// Outbound track capability
    pub track: TrackConfig,
    /// Optional bound on waiting for the offer (unbounded when unset)
    pub offer_timeout_ms: Option<u64>,
    /// Optional bound on ICE candidate gathering (unbounded when unset)
    pub gathering_timeout_ms: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![DEFAULT_STUN_SERVER.to_string()],
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5004)),
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            control_buffer_size: DEFAULT_CONTROL_BUFFER_SIZE,
            track: TrackConfig::default(),
            offer_timeout_ms: None,
            gathering_timeout_ms: None,
        }
    }
}

impl RelayConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RelayConfig = toml::from_str(text)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check the configuration for values the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        for url in &self.ice_servers {
            if !ICE_URL_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
                return Err(Error::Config(format!(
                    "ICE server URL '{}' must start with one of {:?}",
                    url, ICE_URL_SCHEMES
                )));
            }
        }

        if self.recv_buffer_size == 0 {
            return Err(Error::Config("recv_buffer_size must be positive".into()));
        }

        if self.max_datagram_size < RTP_HEADER_LEN || self.max_datagram_size > u16::MAX as usize
        {
            return Err(Error::Config(format!(
                "max_datagram_size {} must be within {}..={}",
                self.max_datagram_size,
                RTP_HEADER_LEN,
                u16::MAX
            )));
        }

        if self.control_buffer_size == 0 {
            return Err(Error::Config("control_buffer_size must be positive".into()));
        }

        let mime = &self.track.mime_type;
        match mime.split_once('/') {
            Some((kind, codec)) if (kind == "video" || kind == "audio") && !codec.is_empty() => {}
            _ => {
                return Err(Error::Config(format!(
                    "track mime_type '{}' must look like video/<codec> or audio/<codec>",
                    mime
                )))
            }
        }

        if self.track.clock_rate == 0 {
            return Err(Error::Config("track clock_rate must be positive".into()));
        }

        if self.track.track_id.is_empty() || self.track.stream_id.is_empty() {
            return Err(Error::Config(
                "track_id and stream_id must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Offer wait bound, if configured
    pub fn offer_timeout(&self) -> Option<Duration> {
        self.offer_timeout_ms.map(Duration::from_millis)
    }

    /// Gathering wait bound, if configured
    pub fn gathering_timeout(&self) -> Option<Duration> {
        self.gathering_timeout_ms.map(Duration::from_millis)
    }
}
