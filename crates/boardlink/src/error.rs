//! Unified error type for Boardlink.

use std::time::Duration;

use boardlink_session::{SessionError, StoreError};
use boardlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attributes let `?` convert sub-crate errors, so callers
/// of the `boardlink` crate deal with this one type.
#[derive(Debug, thiserror::Error)]
pub enum BoardlinkError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A client session error (provisioning, violations).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The persistent store couldn't be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The pairing endpoint couldn't be bound or stopped serving.
    #[error("pairing endpoint: {0}")]
    Pairing(#[source] std::io::Error),

    /// A seat could not be taken.
    #[error(transparent)]
    Table(#[from] TableError),

    /// A connection didn't identify itself in time.
    #[error("no Init received within {0:?}")]
    InitTimeout(Duration),

    /// A connection went away before sending `Init`.
    #[error("connection closed before Init")]
    ClosedBeforeInit,

    /// `Init` named a session the lobby doesn't know.
    #[error("unknown session `{0}`")]
    UnknownSession(String),
}

/// Why a connection couldn't be seated at a table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// Both seats are taken.
    #[error("table `{0}` is full")]
    Full(String),

    /// The game at this table is over.
    #[error("table `{0}` is finished")]
    Finished(String),
}
