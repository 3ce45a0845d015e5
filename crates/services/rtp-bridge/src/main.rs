//! RTP-to-WebRTC bridge binary entry point
//!
//! Reads one base64 offer line from stdin, prints one base64 answer line to
//! stdout, then relays RTP arriving on the UDP listen address to the browser.
//! Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: listen on 127.0.0.1:5004, Google STUN, VP8 track
//! echo "$OFFER" | cargo run -p rtpbridge-server
//!
//! # Override from a config file and flags
//! cargo run -p rtpbridge-server -- \
//!   --config ./rtpbridge.toml \
//!   --listen-addr 0.0.0.0:5004 \
//!   --stun-servers stun:stun.l.google.com:19302,stun:stun1.l.google.com:19302
//! ```

use anyhow::Context;
use clap::Parser;
use rtpbridge_webrtc::signaling::LineSignaling;
use rtpbridge_webrtc::{MediaIngest, PeerSession, RelayConfig, SessionOptions, WebRtcPeer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RTP-to-WebRTC bridge
///
/// Answers a single browser offer exchanged over stdin/stdout and forwards
/// RTP packets received over UDP to the negotiated track.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(short, long, env = "RTPBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// UDP address the RTP source sends to
    #[arg(long, env = "RTPBRIDGE_LISTEN_ADDR")]
    listen_addr: Option<SocketAddr>,

    /// ICE servers (comma-separated)
    #[arg(long, value_delimiter = ',', env = "RTPBRIDGE_STUN_SERVERS")]
    stun_servers: Option<Vec<String>>,

    /// Kernel receive buffer size for the UDP socket
    #[arg(long, env = "RTPBRIDGE_RECV_BUFFER_SIZE")]
    recv_buffer_size: Option<usize>,

    /// Codec MIME type of the outbound track
    #[arg(long, env = "RTPBRIDGE_MIME_TYPE")]
    mime_type: Option<String>,

    /// Give up if no offer arrives within this many milliseconds
    #[arg(long, env = "RTPBRIDGE_OFFER_TIMEOUT_MS")]
    offer_timeout_ms: Option<u64>,

    /// Give up if ICE gathering takes longer than this many milliseconds
    #[arg(long, env = "RTPBRIDGE_GATHERING_TIMEOUT_MS")]
    gathering_timeout_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RelayConfig::default(),
        };

        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(servers) = self.stun_servers {
            config.ice_servers = servers;
        }
        if let Some(size) = self.recv_buffer_size {
            config.recv_buffer_size = size;
        }
        if let Some(mime_type) = self.mime_type {
            config.track.mime_type = mime_type;
        }
        if self.offer_timeout_ms.is_some() {
            config.offer_timeout_ms = self.offer_timeout_ms;
        }
        if self.gathering_timeout_ms.is_some() {
            config.gathering_timeout_ms = self.gathering_timeout_ms;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("rtpbridge-worker")
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> anyhow::Result<()> {
    init_tracing();

    let config = args.into_config()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_addr = %config.listen_addr,
        ice_servers = ?config.ice_servers,
        mime_type = %config.track.mime_type,
        "RTP-to-WebRTC bridge starting"
    );

    // Bind first so a taken port fails before any negotiation
    let ingest = MediaIngest::from_config(&config)
        .await
        .context("Failed to open UDP listener")?;

    let parts = WebRtcPeer::create(&config)
        .await
        .context("Failed to create peer connection")?;

    let mut session = PeerSession::from_parts(parts, SessionOptions::from_config(&config));
    let mut signaling = LineSignaling::stdio();

    let stats = session
        .run(&mut signaling, ingest)
        .await
        .with_context(|| format!("Session failed in state {}", session.state()))?;

    info!(
        received = stats.received,
        forwarded = stats.forwarded,
        dropped = stats.dropped,
        bytes = stats.bytes_forwarded,
        "Peer connection closed, exiting"
    );

    Ok(())
}

fn init_tracing() {
    // RUST_LOG overrides; stdout is reserved for the answer line
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,webrtc=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
