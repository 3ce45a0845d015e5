//! Line-oriented signaling transport
//!
//! One line in (the offer), one line out (the answer). Blank lines are
//! skipped while waiting for the offer, and end-of-input is treated as
//! "nothing yet" rather than an error.

use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Pause before re-reading after the transport reported end-of-input
pub const EOF_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Single-shot signaling transport
///
/// Used exactly once per session: one `receive_offer`, then one `send_answer`.
#[async_trait]
pub trait SignalingChannel: Send {
    /// Wait for the next non-blank line, returned trimmed
    async fn receive_offer(&mut self) -> Result<String>;

    /// Write one newline-terminated line
    async fn send_answer(&mut self, answer: &str) -> Result<()>;
}

/// Signaling over any buffered reader / writer pair
pub struct LineSignaling<R, W> {
    reader: R,
    writer: W,
    eof_retry: Duration,
}

/// Signaling over the process's standard input and output
pub type Stdio = LineSignaling<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl LineSignaling<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio() -> Stdio {
        LineSignaling::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineSignaling<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            eof_retry: EOF_RETRY_INTERVAL,
        }
    }

    /// Override the pause used after end-of-input
    pub fn with_eof_retry(mut self, interval: Duration) -> Self {
        self.eof_retry = interval;
        self
    }

    /// Give back the underlying reader and writer
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[async_trait]
impl<R, W> SignalingChannel for LineSignaling<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn receive_offer(&mut self) -> Result<String> {
        let mut line = String::new();
        let mut reported_eof = false;

        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(|e| Error::Signaling(format!("Failed to read offer: {}", e)))?;

            if read == 0 {
                if !reported_eof {
                    debug!("Signaling input reached end-of-input, waiting for more");
                    reported_eof = true;
                }
                tokio::time::sleep(self.eof_retry).await;
                continue;
            }

            let trimmed = line.trim();
            if !trimmed.is_empty() {
                debug!(len = trimmed.len(), "Received signaling line");
                return Ok(trimmed.to_string());
            }
        }
    }

    async fn send_answer(&mut self, answer: &str) -> Result<()> {
        let map_err = |e: std::io::Error| Error::Signaling(format!("Failed to write answer: {}", e));

        self.writer.write_all(answer.as_bytes()).await.map_err(map_err)?;
        self.writer.write_all(b"\n").await.map_err(map_err)?;
        self.writer.flush().await.map_err(map_err)?;

        debug!(len = answer.len(), "Sent signaling line");
        Ok(())
    }
}
