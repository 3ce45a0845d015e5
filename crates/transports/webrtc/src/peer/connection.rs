//! `webrtc` crate backed peer connection

use super::{ConnectivityHandler, ConnectivityState, GatheringComplete, PeerConnection};
use crate::config::RelayConfig;
use crate::media::TrackSink;
use crate::signaling::SessionDescription;
use crate::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::track_local_static_rtp::TrackLocalStaticRTP;
use webrtc::track::track_local::TrackLocal;

/// Everything created before negotiation: the connection, the sink over
/// the outbound track, and the sender whose RTCP must be drained.
pub struct PeerParts {
    pub connection: Arc<WebRtcPeer>,
    pub sink: Arc<TrackSink>,
    pub sender: Arc<RTCRtpSender>,
}

/// Peer connection wrapper around [`RTCPeerConnection`]
pub struct WebRtcPeer {
    pc: Arc<RTCPeerConnection>,
}

impl WebRtcPeer {
    /// Build the connection and attach the outbound track.
    ///
    /// The track is attached before any description is applied so it is
    /// negotiated into the answer.
    pub async fn create(config: &RelayConfig) -> Result<PeerParts> {
        let setup = |what: &str, e: webrtc::Error| Error::Setup(format!("{}: {}", what, e));

        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| setup("Failed to register codecs", e))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| setup("Failed to register interceptors", e))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers.clone(),
                ..Default::default()
            }]
        };

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| setup("Failed to create peer connection", e))?,
        );

        let track = Arc::new(TrackLocalStaticRTP::new(
            RTCRtpCodecCapability {
                mime_type: config.track.mime_type.clone(),
                clock_rate: config.track.clock_rate,
                ..Default::default()
            },
            config.track.track_id.clone(),
            config.track.stream_id.clone(),
        ));

        let sender = pc
            .add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| setup("Failed to add track", e))?;

        info!(
            mime_type = %config.track.mime_type,
            track_id = %config.track.track_id,
            ice_servers = config.ice_servers.len(),
            "Peer connection created with outbound track"
        );

        Ok(PeerParts {
            sink: Arc::new(TrackSink::new(track, &pc)),
            connection: Arc::new(Self { pc }),
            sender,
        })
    }

    /// Underlying engine connection
    pub fn rtc(&self) -> &Arc<RTCPeerConnection> {
        &self.pc
    }
}

fn map_ice_state(state: RTCIceConnectionState) -> Option<ConnectivityState> {
    let mapped = match state {
        RTCIceConnectionState::New => ConnectivityState::New,
        RTCIceConnectionState::Checking => ConnectivityState::Checking,
        RTCIceConnectionState::Connected => ConnectivityState::Connected,
        RTCIceConnectionState::Completed => ConnectivityState::Completed,
        RTCIceConnectionState::Disconnected => ConnectivityState::Disconnected,
        RTCIceConnectionState::Failed => ConnectivityState::Failed,
        RTCIceConnectionState::Closed => ConnectivityState::Closed,
        RTCIceConnectionState::Unspecified => return None,
    };
    Some(mapped)
}

#[async_trait]
impl PeerConnection for WebRtcPeer {
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = desc.to_rtc()?;
        self.pc
            .set_remote_description(desc)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to set remote description: {}", e)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to create answer: {}", e)))?;
        SessionDescription::from_rtc(&answer)
    }

    async fn gathering_complete(&self) -> GatheringComplete {
        let mut promise = self.pc.gathering_complete_promise().await;
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            if promise.recv().await.is_some() {
                let _ = tx.send(());
            } else {
                debug!("Gathering promise dropped before completion");
            }
        });

        rx
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = desc.to_rtc()?;
        self.pc
            .set_local_description(desc)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to set local description: {}", e)))
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        let desc = self.pc.local_description().await?;
        match SessionDescription::from_rtc(&desc) {
            Ok(desc) => Some(desc),
            Err(e) => {
                warn!("Unusable local description: {}", e);
                None
            }
        }
    }

    fn on_connectivity_state_change(&self, handler: ConnectivityHandler) {
        self.pc
            .on_ice_connection_state_change(Box::new(
                move |state: RTCIceConnectionState| -> Pin<Box<dyn Future<Output = ()> + Send>> {
                    match map_ice_state(state) {
                        Some(state) => handler(state),
                        None => Box::pin(async {}),
                    }
                },
            ));
    }

    async fn close(&self) -> Result<()> {
        self.pc
            .close()
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to close peer connection: {}", e)))
    }
}
