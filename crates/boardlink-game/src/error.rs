//! Error types for the game layer.

use boardlink_protocol::Field;

/// Errors raised by the board model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// A move named a source cell with no piece on it.
    ///
    /// The server only confirms moves of existing pieces, so this means the
    /// local board and the server disagree. The move is rejected and the
    /// board is left as it was.
    #[error("no piece on source field {0}")]
    EmptySource(Field),

    /// Replaying a history stopped at the given (zero-based) entry.
    #[error("history entry {index} could not be replayed: {source}")]
    Replay {
        index: usize,
        #[source]
        source: Box<BoardError>,
    },
}
