//! Error types for surface operations.

use thiserror::Error;

/// Errors that can occur while driving the editing surface.
///
/// Most of these never reach the host: delivery failures are logged and
/// swallowed by the surface, and document mutations degrade to no-ops. They
/// are surfaced from the lower-level building blocks so callers can decide.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SurfaceError {
    /// The stored selection anchor no longer resolves to a live position.
    #[error("stored selection anchor is stale")]
    StaleAnchor,

    /// No selection has been captured yet.
    #[error("no selection anchor has been captured")]
    NoAnchor,

    /// The host exposes no channel for this notification.
    #[error("no host transport available for {0}")]
    NoTransport(&'static str),

    /// The host transport threw while delivering.
    #[error("host transport failed: {0}")]
    Transport(String),

    /// The host asked for a command this surface does not know.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A command parameter was missing or malformed.
    #[error("invalid parameter for {command}: {reason}")]
    InvalidParameter {
        command: &'static str,
        reason: String,
    },

    /// Percent-decoding of host content failed.
    #[error("failed to decode host content: {0}")]
    Decode(String),

    /// The native selection API rejected a range.
    #[error("selection rejected: {0}")]
    Selection(String),

    /// Serialization of the editor state payload failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_piece() {
        assert_eq!(
            SurfaceError::Transport("postMessage threw".into()).to_string(),
            "host transport failed: postMessage threw"
        );
        assert_eq!(
            SurfaceError::NoTransport("height").to_string(),
            "no host transport available for height"
        );
        assert_eq!(
            SurfaceError::InvalidParameter {
                command: "setFontSize",
                reason: "not a number".into(),
            }
            .to_string(),
            "invalid parameter for setFontSize: not a number"
        );
    }
}
