//! Peer connection boundary
//!
//! The bridge drives the WebRTC engine through the [`PeerConnection`] trait so
//! the negotiation logic does not depend on a concrete engine:
//! - [`WebRtcPeer`] - implementation backed by the `webrtc` crate
//! - [`ConnectivityMonitor`] - ICE state observer that closes on failure

pub mod connection;
pub mod monitor;

pub use connection::{PeerParts, WebRtcPeer};
pub use monitor::ConnectivityMonitor;

use crate::signaling::SessionDescription;
use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::oneshot;

/// ICE connectivity state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectivityState::New => "new",
            ConnectivityState::Checking => "checking",
            ConnectivityState::Connected => "connected",
            ConnectivityState::Completed => "completed",
            ConnectivityState::Disconnected => "disconnected",
            ConnectivityState::Failed => "failed",
            ConnectivityState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Callback type for connectivity state changes
pub type ConnectivityHandler = Box<
    dyn Fn(ConnectivityState) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync,
>;

/// Fires once ICE candidate gathering has finished
pub type GatheringComplete = oneshot::Receiver<()>;

/// Negotiated real-time session as seen by the bridge
#[async_trait]
pub trait PeerConnection: Send + Sync + 'static {
    /// Apply the remote offer
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    /// Generate an answer for the applied offer
    async fn create_answer(&self) -> Result<SessionDescription>;

    /// Subscribe to gathering completion.
    ///
    /// Must be called before [`set_local_description`](Self::set_local_description)
    /// so the completion cannot be missed.
    async fn gathering_complete(&self) -> GatheringComplete;

    /// Apply the local answer; starts candidate gathering
    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    /// Current local description, including gathered candidates
    async fn local_description(&self) -> Option<SessionDescription>;

    /// Register the connectivity state handler, replacing any previous one
    fn on_connectivity_state_change(&self, handler: ConnectivityHandler);

    /// Tear down the connection
    async fn close(&self) -> Result<()>;
}
