//! Synthetic RTP datagrams and recording sinks for relay tests

use async_trait::async_trait;
use rtpbridge_webrtc::{Error, MediaSink, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Payload type used for generated packets (dynamic range)
pub const TEST_PAYLOAD_TYPE: u8 = 96;

/// SSRC used for generated packets
pub const TEST_SSRC: u32 = 0xCAFE_F00D;

/// Build a minimal RTP datagram (V=2, no CSRC, no extension)
pub fn rtp_packet(sequence: u16, payload: &[u8]) -> Vec<u8> {
    let timestamp = sequence as u32 * 3000;
    let mut buf = Vec::with_capacity(12 + payload.len());
    buf.push(0x80);
    buf.push(TEST_PAYLOAD_TYPE);
    buf.extend_from_slice(&sequence.to_be_bytes());
    buf.extend_from_slice(&timestamp.to_be_bytes());
    buf.extend_from_slice(&TEST_SSRC.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// A datagram too short to carry an RTP header
pub fn truncated_packet() -> Vec<u8> {
    rtp_packet(0, b"")[..6].to_vec()
}

/// How a [`RecordingSink`] answers writes
#[derive(Debug, Clone, Copy)]
pub enum SinkBehavior {
    /// Accept every write until closed
    Accept,
    /// Accept this many writes, then report closure
    CloseAfter(usize),
    /// Fail every write with a fault
    Fault,
}

/// Sink that records every accepted packet in arrival order
pub struct RecordingSink {
    behavior: SinkBehavior,
    packets: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
}

impl RecordingSink {
    pub fn new(behavior: SinkBehavior) -> Self {
        Self {
            behavior,
            packets: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Make every following write report closure
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn packets(&self) -> Vec<Vec<u8>> {
        self.packets.lock().unwrap().clone()
    }

    pub fn packet_count(&self) -> usize {
        self.packets.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaSink for RecordingSink {
    async fn write(&self, packet: &[u8]) -> Result<usize> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::SinkClosed);
        }

        let mut packets = self.packets.lock().unwrap();
        match self.behavior {
            SinkBehavior::Fault => Err(Error::SinkFault("simulated write failure".into())),
            SinkBehavior::CloseAfter(limit) if packets.len() >= limit => {
                self.closed.store(true, Ordering::SeqCst);
                Err(Error::SinkClosed)
            }
            _ => {
                packets.push(packet.to_vec());
                Ok(packet.len())
            }
        }
    }
}
