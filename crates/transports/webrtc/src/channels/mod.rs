//! Backward control-feedback (RTCP) channel
//!
//! The engine stalls the forward path unless RTCP arriving for the outbound
//! track is read, so the bridge drains it for the life of the session:
//! - [`ControlChannel`] - anything that yields feedback reads
//! - [`ControlChannelDrain`] - background task that reads and discards

mod control;

pub use control::{ControlChannel, ControlChannelDrain};
