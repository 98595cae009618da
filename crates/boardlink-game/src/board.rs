//! The board model: 64 slots, each empty or holding one piece.
//!
//! Only occupancy and color are tracked. Piece kind never changes what the
//! client sends or how it reacts to the server, so it isn't modeled here;
//! the rendering side decides what a piece looks like.
//!
//! The slots are private. The only ways to change them are [`Board::reset`]
//! and [`Board::apply_move`] (plus [`Board::place`] for setting up test
//! positions).

use boardlink_protocol::{Action, Color, FIELD_COUNT, Field, Move};

use crate::BoardError;

/// A piece on the board. Just a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
}

impl Piece {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

/// One occupied cell in a [`Board::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub field: Field,
    pub color: Color,
}

/// Rows filled at the start of a game, per color.
const BLACK_HOME_ROWS: [u8; 2] = [0, 1];
const WHITE_HOME_ROWS: [u8; 2] = [6, 7];

/// The local mirror of piece placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    slots: [Option<Piece>; FIELD_COUNT],
}

impl Board {
    /// A board in the starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.reset();
        board
    }

    /// A board with no pieces on it.
    pub fn empty() -> Self {
        Self {
            slots: [None; FIELD_COUNT],
        }
    }

    /// Restores the starting position: black fills rows 0–1, white fills
    /// rows 6–7, the 32 cells in between are empty.
    pub fn reset(&mut self) {
        self.slots = [None; FIELD_COUNT];
        for field in Field::all() {
            let color = if BLACK_HOME_ROWS.contains(&field.row()) {
                Some(Color::Black)
            } else if WHITE_HOME_ROWS.contains(&field.row()) {
                Some(Color::White)
            } else {
                None
            };
            self.slots[field.index()] = color.map(Piece::new);
        }
    }

    /// Builds a board by replaying `moves` from the starting position.
    ///
    /// Stops at the first move that can't be applied and reports which one.
    pub fn replay<'a>(
        moves: impl IntoIterator<Item = &'a Move>,
    ) -> Result<Self, BoardError> {
        let mut board = Self::new();
        for (index, mv) in moves.into_iter().enumerate() {
            board.apply_move(mv).map_err(|e| BoardError::Replay {
                index,
                source: Box::new(e),
            })?;
        }
        Ok(board)
    }

    /// Applies a confirmed move.
    ///
    /// - `Replace`: the destination takes the source piece and the source
    ///   becomes empty. Returns whatever was on the destination (a capture).
    /// - `Swap`: the two cells exchange contents. Returns `None`.
    ///
    /// # Errors
    /// [`BoardError::EmptySource`] if there is no piece on `mv.src`. The
    /// board is not modified in that case.
    pub fn apply_move(&mut self, mv: &Move) -> Result<Option<Piece>, BoardError> {
        let src = mv.src.index();
        let dst = mv.dst.index();
        let piece = self.slots[src].ok_or(BoardError::EmptySource(mv.src))?;

        match mv.action {
            Action::Replace => {
                let captured = self.slots[dst];
                self.slots[src] = None;
                self.slots[dst] = Some(piece);
                // A move onto its own cell leaves the piece where it was.
                Ok(if src == dst { None } else { captured })
            }
            Action::Swap => {
                self.slots.swap(src, dst);
                Ok(None)
            }
        }
    }

    /// The piece on `field`, if any.
    pub fn piece_at(&self, field: Field) -> Option<Piece> {
        self.slots[field.index()]
    }

    /// The color of the piece on `field`, if any.
    pub fn color_at(&self, field: Field) -> Option<Color> {
        self.piece_at(field).map(|p| p.color)
    }

    /// Puts `piece` on `field` (or clears it with `None`).
    ///
    /// For building arbitrary positions in tests and referee setups; the
    /// session path only ever changes the board through `apply_move`.
    pub fn place(&mut self, field: Field, piece: Option<Piece>) {
        self.slots[field.index()] = piece;
    }

    /// Every occupied cell with its color, in row-major order.
    ///
    /// Returns an owned list, so callers never hold on to the board itself.
    pub fn snapshot(&self) -> Vec<Placement> {
        Field::all()
            .filter_map(|field| {
                self.color_at(field).map(|color| Placement { field, color })
            })
            .collect()
    }

    /// Number of pieces of `color` on the board.
    pub fn count(&self, color: Color) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|p| p.color == color)
            .count()
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
