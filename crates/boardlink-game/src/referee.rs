//! The `Referee` trait: the legality oracle used by the relay server.
//!
//! The client never decides what is legal. It asks for hints, proposes
//! moves, and mirrors whatever the server confirms. The server, in turn,
//! asks a referee. Plug in a full chess rules engine here; the workspace
//! ships only [`FreeplayReferee`], which checks ownership and nothing else.

use boardlink_protocol::{Color, Field, GameResult, Move};

use crate::Board;

/// Decides legal destinations, accepts or rejects moves, and calls the game.
pub trait Referee: Send + Sync + 'static {
    /// Legal destinations for the piece on `src`, moved by `player`.
    ///
    /// Should be empty when `src` doesn't hold one of `player`'s pieces.
    fn destinations(&self, board: &Board, src: Field, player: Color) -> Vec<Field>;

    /// Returns `true` if `player` may play `mv` on `board`.
    ///
    /// Default: the destination is one of [`destinations`](Self::destinations).
    fn permits(&self, board: &Board, mv: &Move, player: Color) -> bool {
        self.destinations(board, mv.src, player).contains(&mv.dst)
    }

    /// Called after every accepted move. `Some` ends the game.
    ///
    /// `moves_played` counts accepted moves including the one just applied.
    fn outcome(&self, _board: &Board, _moves_played: usize) -> Option<GameResult> {
        None
    }
}

/// A referee with no movement rules.
///
/// Any own piece may go to any other field. The game ends when one color
/// has no pieces left, or in a draw once `move_limit` moves were played.
#[derive(Debug, Clone, Default)]
pub struct FreeplayReferee {
    pub move_limit: Option<usize>,
}

impl FreeplayReferee {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a draw after `limit` accepted moves.
    pub fn with_move_limit(limit: usize) -> Self {
        Self {
            move_limit: Some(limit),
        }
    }
}

impl Referee for FreeplayReferee {
    fn destinations(&self, board: &Board, src: Field, player: Color) -> Vec<Field> {
        if board.color_at(src) != Some(player) {
            return Vec::new();
        }
        Field::all().filter(|&f| f != src).collect()
    }

    fn outcome(&self, board: &Board, moves_played: usize) -> Option<GameResult> {
        for color in [Color::Black, Color::White] {
            if board.count(color) == 0 {
                return Some(GameResult::win_for(color.opponent()));
            }
        }
        match self.move_limit {
            Some(limit) if moves_played >= limit => Some(GameResult::Draw),
            _ => None,
        }
    }
}
