//! Percent-encoding for content crossing the host boundary.
//!
//! Hosts encode with `encodeURIComponent` semantics. Decoding never maps `+`
//! to a space, so base64 `data:` URIs survive the round trip.

use crate::error::SurfaceError;

/// Percent-encode content for the host.
pub fn encode(content: &str) -> String {
    urlencoding::encode(content).into_owned()
}

/// Decode percent-encoded host content.
pub fn decode(encoded: &str) -> Result<String, SurfaceError> {
    urlencoding::decode(encoded)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SurfaceError::Decode(e.to_string()))
}
