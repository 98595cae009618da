//! Wire protocol for Boardlink.
//!
//! This crate defines the "language" the board client and the relay server
//! speak:
//!
//! - **Types** ([`Field`], [`Color`], [`Action`], [`Move`], [`GameResult`]):
//!   the values that travel on the wire and get persisted.
//! - **Codec** ([`Message`], [`MessageKind`]): the six message kinds and
//!   their fixed-offset binary layouts.
//! - **Errors** ([`ProtocolError`]): everything that can be wrong with a
//!   received buffer.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Session / Table (game state)
//! ```
//!
//! The protocol layer knows nothing about sockets, boards, or sessions.

mod codec;
mod error;
mod types;

pub use codec::{Direction, Message, MessageKind};
pub use error::ProtocolError;
pub use types::{
    Action, BOARD_SIZE, Color, FIELD_COUNT, Field, GameResult, Move,
};
