//! Error types for the RTP bridge transport

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while negotiating or relaying
#[derive(Debug, Error)]
pub enum Error {
    /// Connection or track construction failed
    #[error("Setup error: {0}")]
    Setup(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session description could not be serialized for the signaling channel
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Signaling text is not a valid encoded session description
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Out-of-band signaling transport failed
    #[error("Signaling error: {0}")]
    Signaling(String),

    /// Engine rejected a description or failed to produce one
    #[error("Negotiation error: {0}")]
    Negotiation(String),

    /// UDP ingest socket failed
    #[error("Ingress fault: {0}")]
    IngressFault(String),

    /// Datagram is not a valid RTP packet
    #[error("Packet decode error: {0}")]
    PacketDecode(String),

    /// Outbound sink has been closed
    #[error("Media sink closed")]
    SinkClosed,

    /// Outbound sink failed for any reason other than closure
    #[error("Sink fault: {0}")]
    SinkFault(String),

    /// Control feedback channel has been closed
    #[error("Control channel closed")]
    ControlClosed,

    /// Reading control feedback failed for any reason other than closure
    #[error("Control channel fault: {0}")]
    ControlFault(String),

    /// A bounded wait expired
    #[error("Timed out after {timeout_ms}ms waiting for {context}")]
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
        /// What was being waited for
        context: String,
    },

    /// Operation not allowed in the current session state
    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

impl Error {
    /// True for the errors raised by the signaling codec
    pub fn is_codec_error(&self) -> bool {
        matches!(self, Error::Encoding(_) | Error::Decoding(_))
    }

    /// True when the error is the expected end-of-stream condition of the sink
    pub fn is_sink_closed(&self) -> bool {
        matches!(self, Error::SinkClosed)
    }
}

impl From<webrtc::Error> for Error {
    fn from(e: webrtc::Error) -> Self {
        Error::Negotiation(e.to_string())
    }
}
