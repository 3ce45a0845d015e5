//! RTCP drain for the outbound track's sender

use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;

/// Source of inbound control feedback
///
/// `read` blocks until feedback arrives and returns how many packets were
/// read; an error means the channel is finished.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    async fn read(&self, buf: &mut [u8]) -> Result<usize>;
}

#[async_trait]
impl ControlChannel for RTCRtpSender {
    async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let (packets, _attributes) = RTCRtpSender::read(self, buf).await.map_err(read_error)?;
        Ok(packets.len())
    }
}

fn read_error(e: webrtc::Error) -> Error {
    match e {
        webrtc::Error::ErrClosedPipe => Error::ControlClosed,
        other => Error::ControlFault(format!("RTCP read failed: {}", other)),
    }
}

/// Reads and discards control feedback until the channel ends
pub struct ControlChannelDrain;

impl ControlChannelDrain {
    /// Spawn the drain task.
    ///
    /// The task resolves to the number of successful reads once the channel
    /// reports closure or any error; neither is treated as a fault.
    pub fn spawn<C>(channel: Arc<C>, buffer_size: usize) -> JoinHandle<u64>
    where
        C: ControlChannel + ?Sized + 'static,
    {
        tokio::spawn(async move {
            let mut scratch = vec![0u8; buffer_size];
            let mut reads = 0u64;

            loop {
                match channel.read(&mut scratch).await {
                    Ok(_) => reads += 1,
                    Err(Error::ControlClosed) => {
                        debug!(reads, "Control channel closed, drain stopped");
                        return reads;
                    }
                    Err(e) => {
                        debug!(reads, "Control channel drain stopped: {}", e);
                        return reads;
                    }
                }
            }
        })
    }
}
