//! RTP framing check
//!
//! Parsing is advisory: it only decides forward-vs-drop. The relay always
//! forwards the original bytes, never a re-serialized packet.

use crate::{Error, Result};
use webrtc::rtp::header::Header;
use webrtc::rtp::packet::Packet;
use webrtc::util::Unmarshal;

/// The only RTP version in use (RFC 3550)
pub const RTP_VERSION: u8 = 2;

/// Parse `datagram` as an RTP packet and return its header
pub fn validate_rtp(datagram: &[u8]) -> Result<Header> {
    let mut raw = datagram;
    let packet = Packet::unmarshal(&mut raw)
        .map_err(|e| Error::PacketDecode(format!("{} ({} bytes)", e, datagram.len())))?;

    if packet.header.version != RTP_VERSION {
        return Err(Error::PacketDecode(format!(
            "unsupported RTP version {}",
            packet.header.version
        )));
    }

    Ok(packet.header)
}
