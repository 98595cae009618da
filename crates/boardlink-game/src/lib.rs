//! Board model, selection state machine, and legality seam for Boardlink.
//!
//! - [`Board`]: the 64-slot mirror of piece placement.
//! - [`Selection`]: turns discrete clicks into `HintRequest`/`Move`
//!   proposals, holding at most one pending selection.
//! - [`Referee`]: what the relay server asks about legality and outcome.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (client) ─┐        ┌─ Relay tables (server)
//!                         ▼        ▼
//!               Game Layer (this crate)
//!                         ▼
//!               Protocol Layer (Field, Move, Color)
//! ```

mod board;
mod error;
mod referee;
mod selection;

pub use board::{Board, Piece, Placement};
pub use error::BoardError;
pub use referee::{FreeplayReferee, Referee};
pub use selection::{Button, InputEvent, Selection, SelectionState};
