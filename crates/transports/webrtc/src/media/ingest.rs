//! UDP RTP ingest loop

use super::{validate_rtp, MediaSink};
use crate::config::RelayConfig;
use crate::{Error, Result};
use socket2::SockRef;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info, trace, warn};

/// Forwarded-packet interval between progress log lines
const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Counters reported when the ingest loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Datagrams read from the socket
    pub received: u64,
    /// Datagrams written to the sink
    pub forwarded: u64,
    /// Datagrams dropped for failing RTP validation
    pub dropped: u64,
    /// Bytes written to the sink
    pub bytes_forwarded: u64,
}

/// Owns the UDP listener and relays validated RTP into a [`MediaSink`]
pub struct MediaIngest {
    socket: UdpSocket,
    buf: Vec<u8>,
    local_addr: SocketAddr,
}

impl MediaIngest {
    /// Bind the ingest socket and enlarge its receive buffer
    pub async fn bind(
        addr: SocketAddr,
        recv_buffer_size: usize,
        max_datagram_size: usize,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| Error::IngressFault(format!("Failed to bind {}: {}", addr, e)))?;

        let sock_ref = SockRef::from(&socket);
        sock_ref.set_recv_buffer_size(recv_buffer_size).map_err(|e| {
            Error::IngressFault(format!(
                "Failed to set receive buffer to {} bytes: {}",
                recv_buffer_size, e
            ))
        })?;

        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::IngressFault(format!("Failed to read local address: {}", e)))?;

        match sock_ref.recv_buffer_size() {
            Ok(actual) => debug!(requested = recv_buffer_size, actual, "Ingest receive buffer sized"),
            Err(e) => debug!("Could not read back receive buffer size: {}", e),
        }

        info!(%local_addr, "Listening for RTP");

        Ok(Self {
            socket,
            buf: vec![0u8; max_datagram_size],
            local_addr,
        })
    }

    /// Bind using the endpoint and buffer sizes from `config`
    pub async fn from_config(config: &RelayConfig) -> Result<Self> {
        Self::bind(
            config.listen_addr,
            config.recv_buffer_size,
            config.max_datagram_size,
        )
        .await
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Relay datagrams into `sink` until it reports closure.
    ///
    /// Malformed datagrams are dropped and the loop continues. Socket read
    /// failures and sink faults other than closure end the loop with an error.
    pub async fn run<S>(mut self, sink: &S) -> Result<IngestStats>
    where
        S: MediaSink + ?Sized,
    {
        let mut stats = IngestStats::default();

        loop {
            let (len, from) = self
                .socket
                .recv_from(&mut self.buf)
                .await
                .map_err(|e| Error::IngressFault(format!("Error reading RTP packet: {}", e)))?;
            stats.received += 1;

            let datagram = &self.buf[..len];

            if let Err(e) = validate_rtp(datagram) {
                stats.dropped += 1;
                warn!(%from, len, "Dropping datagram: {}", e);
                continue;
            }

            match sink.write(datagram).await {
                Ok(_) => {
                    stats.forwarded += 1;
                    stats.bytes_forwarded += len as u64;
                    trace!(len, "Forwarded RTP packet");
                }
                Err(e) if e.is_sink_closed() => {
                    info!(
                        forwarded = stats.forwarded,
                        dropped = stats.dropped,
                        "Media sink closed, stopping ingest"
                    );
                    return Ok(stats);
                }
                Err(e @ Error::SinkFault(_)) => return Err(e),
                Err(e) => return Err(Error::SinkFault(e.to_string())),
            }

            if stats.forwarded % PROGRESS_LOG_INTERVAL == 0 {
                debug!(
                    forwarded = stats.forwarded,
                    dropped = stats.dropped,
                    bytes = stats.bytes_forwarded,
                    "Ingest progress"
                );
            }
        }
    }
}
