//! Out-of-band signaling for the offer/answer exchange
//!
//! The bridge accepts exactly one offer and produces exactly one answer:
//! - [`SessionDescription`] - engine-independent description (type tag + SDP)
//! - [`codec`] - base64(JSON) text envelope used on the wire
//! - [`SignalingChannel`] - single-shot line transport (stdin/stdout by default)

pub mod channel;
pub mod codec;
pub mod description;

pub use channel::{LineSignaling, SignalingChannel, Stdio};
pub use codec::{decode, encode};
pub use description::{SdpType, SessionDescription};
