//! Value types shared by every layer of Boardlink.
//!
//! These are the small things that travel on the wire and get persisted:
//! board coordinates, player colors, move actions, moves, and game results.
//! None of them have identity beyond their value, so they are all `Copy`.

// `Serialize`/`Deserialize` are derived so the session layer can persist a
// move history and a color assignment without a second set of types.
use serde::{Deserialize, Serialize};

use std::fmt;

/// Width and height of the board, in fields.
pub const BOARD_SIZE: u8 = 8;

/// Total number of fields on the board.
pub const FIELD_COUNT: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// One of the 64 board cells, addressed by row and column.
///
/// Both coordinates are in `0..8`. The constructor checks the range, so any
/// `Field` value that exists is a valid board cell. That lets the encoder
/// write coordinates without re-validating them.
///
/// `#[serde(try_from = ...)]` routes deserialization through the same range
/// check, so a corrupted history file can't smuggle in `{ row: 9, col: 0 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawField")]
pub struct Field {
    row: u8,
    col: u8,
}

/// Unchecked shape used only while deserializing a [`Field`].
#[derive(Deserialize)]
struct RawField {
    row: u8,
    col: u8,
}

impl TryFrom<RawField> for Field {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        Field::new(raw.row, raw.col).ok_or_else(|| {
            format!("field ({}, {}) is off the board", raw.row, raw.col)
        })
    }
}

impl Field {
    /// Creates a field, or `None` if either coordinate is off the board.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Creates a field from a slot index (`row * 8 + col`).
    pub fn from_index(index: usize) -> Option<Self> {
        if index < FIELD_COUNT {
            let size = BOARD_SIZE as usize;
            Some(Self {
                row: (index / size) as u8,
                col: (index % size) as u8,
            })
        } else {
            None
        }
    }

    /// Row coordinate, `0..8`.
    pub fn row(self) -> u8 {
        self.row
    }

    /// Column coordinate, `0..8`.
    pub fn col(self) -> u8 {
        self.col
    }

    /// Slot index in a row-major 64-element array.
    pub fn index(self) -> usize {
        self.row as usize * BOARD_SIZE as usize + self.col as usize
    }

    /// Iterates over all 64 fields in row-major order.
    pub fn all() -> impl Iterator<Item = Field> {
        (0..FIELD_COUNT).filter_map(Field::from_index)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A player's color.
///
/// On the wire: `Black = 0`, `White = 1`. The same numbers are used for
/// the acting-player byte of `Move` and `HintRequest`, for `Assign`, and
/// for the persisted assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The wire byte for this color.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::White => 1,
        }
    }

    /// Parses a wire byte. Anything other than 0 or 1 is `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Black),
            1 => Some(Self::White),
            _ => None,
        }
    }

    /// The other color.
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => write!(f, "black"),
            Self::White => write!(f, "white"),
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// What a move does to the destination cell.
///
/// The player never picks this directly: it is `Swap` exactly when the
/// destination holds one of the mover's own pieces, and `Replace` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// The moving piece takes the destination; whatever was there is gone.
    Replace,
    /// The two cells exchange contents.
    Swap,
}

impl Action {
    /// The wire byte for this action.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Replace => 0,
            Self::Swap => 1,
        }
    }

    /// Parses a wire byte. Anything other than 0 or 1 is `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Replace),
            1 => Some(Self::Swap),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A single move: a source, a destination, and the derived action.
///
/// This is also the record stored in the persisted move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub src: Field,
    pub dst: Field,
    pub action: Action,
}

impl Move {
    pub fn new(src: Field, dst: Field, action: Action) -> Self {
        Self { src, dst, action }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.action {
            Action::Replace => "->",
            Action::Swap => "<->",
        };
        write!(f, "{}{}{}", self.src, arrow, self.dst)
    }
}

// ---------------------------------------------------------------------------
// GameResult
// ---------------------------------------------------------------------------

/// How a game ended. Terminal: once a session sees one, it's over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    BlackWin,
    WhiteWin,
    Draw,
}

impl GameResult {
    /// The `Finish` reason byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::BlackWin => 0,
            Self::WhiteWin => 1,
            Self::Draw => 2,
        }
    }

    /// Parses a `Finish` reason byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::BlackWin),
            1 => Some(Self::WhiteWin),
            2 => Some(Self::Draw),
            _ => None,
        }
    }

    /// The result in which `color` wins.
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::Black => Self::BlackWin,
            Color::White => Self::WhiteWin,
        }
    }

    /// The winning color, or `None` for a draw.
    pub fn winner(self) -> Option<Color> {
        match self {
            Self::BlackWin => Some(Color::Black),
            Self::WhiteWin => Some(Color::White),
            Self::Draw => None,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlackWin => write!(f, "black won"),
            Self::WhiteWin => write!(f, "white won"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
