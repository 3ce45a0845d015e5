//! One negotiated session: handshake, then relay
//!
//! The handshake is strictly ordered: the offer is applied before the answer
//! is generated, the answer is finalized (all candidates gathered) before it
//! is sent, and media flows only after the answer went out.

use super::SessionState;
use crate::channels::{ControlChannel, ControlChannelDrain};
use crate::config::{RelayConfig, DEFAULT_CONTROL_BUFFER_SIZE};
use crate::media::{IngestStats, MediaIngest, MediaSink};
use crate::peer::{ConnectivityMonitor, ConnectivityState, PeerConnection, PeerParts, WebRtcPeer};
use crate::signaling::{codec, SdpType, SessionDescription, SignalingChannel};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Per-session knobs taken from [`RelayConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Bound on waiting for the offer; `None` waits forever
    pub offer_timeout: Option<Duration>,
    /// Bound on ICE gathering; `None` waits forever
    pub gathering_timeout: Option<Duration>,
    /// Scratch buffer size for the RTCP drain
    pub control_buffer_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            offer_timeout: None,
            gathering_timeout: None,
            control_buffer_size: DEFAULT_CONTROL_BUFFER_SIZE,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            offer_timeout: config.offer_timeout(),
            gathering_timeout: config.gathering_timeout(),
            control_buffer_size: config.control_buffer_size,
        }
    }
}

/// Orchestrates one peer connection for the lifetime of the process
///
/// Owns the connection handle and hands it to the components that need it;
/// nothing is shared through globals.
pub struct PeerSession<P: PeerConnection> {
    connection: Arc<P>,
    sink: Arc<dyn MediaSink>,
    control: Arc<dyn ControlChannel>,
    options: SessionOptions,
    state: SessionState,
    monitor: Option<ConnectivityMonitor>,
}

impl PeerSession<WebRtcPeer> {
    /// Session over a `webrtc` crate connection built by [`WebRtcPeer::create`]
    pub fn from_parts(parts: PeerParts, options: SessionOptions) -> Self {
        let PeerParts {
            connection,
            sink,
            sender,
        } = parts;
        Self::new(connection, sink, sender, options)
    }
}

impl<P: PeerConnection> PeerSession<P> {
    /// Wrap a connection whose outbound track is already attached.
    ///
    /// `sink` is the attached track and `control` the handle returned when
    /// attaching it, so the session starts out awaiting the offer.
    pub fn new(
        connection: Arc<P>,
        sink: Arc<dyn MediaSink>,
        control: Arc<dyn ControlChannel>,
        options: SessionOptions,
    ) -> Self {
        let mut session = Self {
            connection,
            sink,
            control,
            options,
            state: SessionState::Created,
            monitor: None,
        };
        session.advance(SessionState::AwaitingOffer);
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connection(&self) -> &Arc<P> {
        &self.connection
    }

    /// Connectivity updates, available once relaying has started
    pub fn connectivity(&self) -> Option<watch::Receiver<ConnectivityState>> {
        self.monitor.as_ref().map(ConnectivityMonitor::subscribe)
    }

    /// Negotiate and then relay until the sink closes
    pub async fn run<C>(&mut self, signaling: &mut C, ingest: MediaIngest) -> Result<IngestStats>
    where
        C: SignalingChannel + ?Sized,
    {
        self.negotiate(signaling).await?;
        self.relay(ingest).await
    }

    /// Perform the single offer/answer exchange.
    ///
    /// Returns the answer that was sent. Any failure closes the session;
    /// there is no second attempt.
    pub async fn negotiate<C>(&mut self, signaling: &mut C) -> Result<SessionDescription>
    where
        C: SignalingChannel + ?Sized,
    {
        self.expect(SessionState::AwaitingOffer)?;

        let result = self.exchange(signaling).await;
        if let Err(e) = &result {
            error!(state = %self.state, "Negotiation failed: {}", e);
            self.advance(SessionState::Closed);
        }
        result
    }

    async fn exchange<C>(&mut self, signaling: &mut C) -> Result<SessionDescription>
    where
        C: SignalingChannel + ?Sized,
    {
        info!("Waiting for offer on signaling channel");
        let offer_text = bounded(
            self.options.offer_timeout,
            "offer",
            signaling.receive_offer(),
        )
        .await?;

        let offer = codec::decode(&offer_text)?;
        if offer.sdp_type != SdpType::Offer {
            return Err(Error::Negotiation(format!(
                "expected an offer, got {}",
                offer.sdp_type
            )));
        }

        self.connection.set_remote_description(offer).await?;
        self.advance(SessionState::Negotiating);

        let answer = self.connection.create_answer().await?;

        // Subscribe before applying the answer so completion cannot be missed
        let gathered = self.connection.gathering_complete().await;
        self.connection.set_local_description(answer).await?;
        self.advance(SessionState::GatheringCandidates);

        bounded(self.options.gathering_timeout, "ICE gathering", async {
            gathered.await.map_err(|_| {
                Error::Negotiation("gathering completion signal dropped".into())
            })
        })
        .await?;
        debug!("ICE candidate gathering complete");

        let local = self.connection.local_description().await.ok_or_else(|| {
            Error::Negotiation("no local description after gathering".into())
        })?;

        let answer_text = codec::encode(&local)?;
        signaling.send_answer(&answer_text).await?;
        self.advance(SessionState::Answered);

        info!(len = answer_text.len(), "Answer sent");
        Ok(local)
    }

    /// Start the connectivity monitor and RTCP drain, then relay until the
    /// sink closes.
    pub async fn relay(&mut self, ingest: MediaIngest) -> Result<IngestStats> {
        self.expect(SessionState::Answered)?;

        self.monitor = Some(ConnectivityMonitor::attach(&self.connection));
        let _drain =
            ControlChannelDrain::spawn(Arc::clone(&self.control), self.options.control_buffer_size);
        self.advance(SessionState::Relaying);

        let result = ingest.run(self.sink.as_ref()).await;
        self.advance(SessionState::Closed);

        match &result {
            Ok(stats) => info!(
                forwarded = stats.forwarded,
                dropped = stats.dropped,
                "Relay finished"
            ),
            Err(e) => error!("Relay failed: {}", e),
        }
        result
    }

    fn expect(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "expected {}, session is {}",
                expected, self.state
            )))
        }
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, "Session state changed");
        self.state = next;
    }
}

/// Await `fut`, failing with [`Error::Timeout`] if `limit` elapses first
async fn bounded<T, F>(limit: Option<Duration>, context: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout {
                timeout_ms: limit.as_millis() as u64,
                context: context.to_string(),
            })?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_without_limit() {
        let value = bounded(None, "noop", async { Ok::<_, Error>(5) }).await.unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded(
            Some(Duration::from_millis(10)),
            "offer",
            futures::future::pending(),
        )
        .await;

        match result {
            Err(Error::Timeout {
                timeout_ms,
                context,
            }) => {
                assert_eq!(timeout_ms, 10);
                assert_eq!(context, "offer");
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_options_from_config() {
        let config = RelayConfig {
            offer_timeout_ms: Some(1500),
            control_buffer_size: 512,
            ..Default::default()
        };
        let options = SessionOptions::from_config(&config);
        assert_eq!(options.offer_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(options.gathering_timeout, None);
        assert_eq!(options.control_buffer_size, 512);
    }
}
