//! Error types for the session layer.

use boardlink_game::BoardError;
use boardlink_protocol::{MessageKind, ProtocolError};

/// Errors from a [`SessionStore`](crate::SessionStore).
///
/// A failing store never stops a game: the session logs these and carries
/// on in memory, it just won't survive a reload.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing files failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be (de)serialized.
    #[error("store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    /// A stored value parsed but isn't meaningful (e.g. color byte 7).
    #[error("corrupt stored value for `{key}`: {reason}")]
    Corrupt { key: &'static str, reason: String },
}

/// Errors that can occur while driving a client session.
///
/// None of these are fatal to the session. The caller logs them and drops
/// the offending message or input; board and history are unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A received buffer was not a valid message.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A server-confirmed move couldn't be applied to the local board.
    #[error("protocol violation: {0}")]
    Board(#[from] BoardError),

    /// The server sent a kind only clients may send.
    #[error("protocol violation: {0} is a client-to-server message")]
    Misdirected(MessageKind),

    /// A message arrived after the game was already finished.
    #[error("session is finished, {0} ignored")]
    Terminal(MessageKind),

    /// The pairing endpoint couldn't be reached or answered with an error.
    #[error("pairing request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No session id could be obtained.
    #[error("session id provisioning failed: {0}")]
    ProvisionFailed(String),
}
