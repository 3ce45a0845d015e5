//! Text envelope for session descriptions
//!
//! Descriptions travel over a text-only channel as standard base64 of their
//! JSON form, one description per line.

use super::SessionDescription;
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode a description as base64(JSON)
pub fn encode(desc: &SessionDescription) -> Result<String> {
    let json = serde_json::to_vec(desc)
        .map_err(|e| Error::Encoding(format!("Failed to serialize description: {}", e)))?;
    Ok(STANDARD.encode(json))
}

/// Decode a base64(JSON) line into a description
pub fn decode(text: &str) -> Result<SessionDescription> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| Error::Decoding(format!("Invalid base64: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Decoding(format!("Invalid session description JSON: {}", e)))
}
