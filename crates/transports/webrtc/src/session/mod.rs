//! Peer session orchestration
//!
//! Drives one connection from creation through the offer/answer exchange to
//! the relay loop.

mod peer_session;
mod state;

pub use peer_session::{PeerSession, SessionOptions};
pub use state::SessionState;
