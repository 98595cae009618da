//! Error types for the protocol layer.
//!
//! Every way a byte buffer can fail to be a message has its own variant.
//! Decoding never panics: it returns one of these instead, and the caller
//! decides whether to log and drop (the usual answer) or to act on it.

use crate::MessageKind;

/// Errors that can occur while decoding a wire buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The buffer had no bytes at all, so not even a tag.
    #[error("empty buffer")]
    Empty,

    /// The leading tag byte doesn't name any known message kind.
    ///
    /// This is the "unknown message" outcome: receivers log it and move on.
    #[error("unknown message tag {0}")]
    UnknownTag(u8),

    /// The payload is shorter than its kind requires.
    #[error("{kind} payload truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        kind: MessageKind,
        expected: usize,
        actual: usize,
    },

    /// A fixed-size payload was followed by extra bytes.
    #[error("{kind} payload has {extra} trailing bytes")]
    TrailingBytes { kind: MessageKind, extra: usize },

    /// A row or column byte is outside `0..8`.
    #[error("field ({row},{col}) is off the board")]
    InvalidField { row: u8, col: u8 },

    /// A color byte is neither 0 (black) nor 1 (white).
    #[error("invalid color byte {0}")]
    InvalidColor(u8),

    /// An action byte is neither 0 (replace) nor 1 (swap).
    #[error("invalid action byte {0}")]
    InvalidAction(u8),

    /// A finish reason byte is not 0, 1, or 2.
    #[error("invalid result byte {0}")]
    InvalidResult(u8),

    /// The session id of an `Init` message is not valid UTF-8.
    #[error("session id is not valid UTF-8")]
    InvalidUtf8,
}
