//! A table: the server-side game for one session id.
//!
//! Two seats, one per color, each wired to its connection task through an
//! unbounded channel of [`Outbound`] frames. The table owns the
//! authoritative board and the turn; it checks every proposal against both
//! and against the [`Referee`] before echoing it to the seats.
//!
//! # Seating
//!
//! Seats go out in join order: the first joiner gets the color that moves
//! first, the second the other one. When a seat is vacated, the next
//! joiner takes it and is told its color again. A third concurrent joiner
//! is refused.
//!
//! Play only happens with both seats taken. A seat that is away misses no
//! move, so a player rejoining with its stored history is still in step
//! with the table.

use std::time::{Duration, Instant};

use boardlink_game::{Board, Referee};
use boardlink_protocol::{Action, Color, GameResult, Message};
use boardlink_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::TableError;

/// What a table asks a connection task to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send this encoded message.
    Frame(Vec<u8>),
    /// Close the connection.
    Close,
}

struct Seat {
    conn: ConnectionId,
    tx: mpsc::UnboundedSender<Outbound>,
}

/// One game between two seats.
pub struct Table {
    id: String,
    board: Board,
    first_to_move: Color,
    turn: Color,
    moves_played: usize,
    result: Option<GameResult>,
    /// Indexed by `Color::to_byte()`.
    seats: [Option<Seat>; 2],
    /// Set while no seat is taken.
    idle_since: Option<Instant>,
}

impl Table {
    pub fn new(id: impl Into<String>, first_to_move: Color) -> Self {
        Self {
            id: id.into(),
            board: Board::new(),
            first_to_move,
            turn: first_to_move,
            moves_played: 0,
            result: None,
            seats: [None, None],
            idle_since: Some(Instant::now()),
        }
    }

    /// Seats a connection and sends it `Assign`.
    pub fn join(
        &mut self,
        conn: ConnectionId,
        tx: mpsc::UnboundedSender<Outbound>,
    ) -> Result<Color, TableError> {
        if self.result.is_some() {
            return Err(TableError::Finished(self.id.clone()));
        }

        let color = [self.first_to_move, self.first_to_move.opponent()]
            .into_iter()
            .find(|c| self.seats[seat_index(*c)].is_none())
            .ok_or_else(|| TableError::Full(self.id.clone()))?;

        self.seats[seat_index(color)] = Some(Seat { conn, tx });
        self.idle_since = None;
        tracing::info!(table = %self.id, %conn, %color, "seat taken");
        self.send_to(color, &Message::Assign { color });
        Ok(color)
    }

    /// Vacates the seat held by `conn`, if any.
    pub fn leave(&mut self, conn: ConnectionId) {
        for slot in &mut self.seats {
            if slot.as_ref().is_some_and(|s| s.conn == conn) {
                *slot = None;
                tracing::info!(table = %self.id, %conn, "seat vacated");
            }
        }
        if self.seated() == 0 && self.idle_since.is_none() {
            self.idle_since = Some(Instant::now());
        }
    }

    /// Handles a message from the seat playing `seat`.
    ///
    /// Returns `true` when the message finished the game. Nothing is played
    /// while a seat is empty.
    pub fn handle<R: Referee>(&mut self, seat: Color, msg: Message, referee: &R) -> bool {
        if self.result.is_some() {
            tracing::debug!(table = %self.id, kind = %msg.kind(), "table finished, dropped");
            return false;
        }
        if !self.is_full() {
            tracing::debug!(table = %self.id, kind = %msg.kind(), "opponent away, dropped");
            return false;
        }

        match msg {
            Message::HintRequest { src, player } => {
                if player != seat || self.turn != seat {
                    tracing::debug!(table = %self.id, %seat, %player, "hint request out of turn");
                    return false;
                }
                let fields = referee.destinations(&self.board, src, seat);
                tracing::debug!(table = %self.id, %src, count = fields.len(), "hint");
                self.send_to(seat, &Message::Hint { fields });
                false
            }

            Message::Move { mv, player } => {
                if player != seat || self.turn != seat {
                    tracing::debug!(table = %self.id, %seat, %player, %mv, "move out of turn");
                    return false;
                }
                let expected = if self.board.color_at(mv.dst) == Some(seat) {
                    Action::Swap
                } else {
                    Action::Replace
                };
                if mv.action != expected || !referee.permits(&self.board, &mv, seat) {
                    tracing::debug!(table = %self.id, %seat, %mv, "move refused");
                    return false;
                }
                if let Err(e) = self.board.apply_move(&mv) {
                    tracing::warn!(table = %self.id, error = %e, "referee permitted an inapplicable move");
                    return false;
                }

                self.moves_played += 1;
                self.turn = seat.opponent();
                tracing::debug!(table = %self.id, %seat, %mv, "move accepted");
                self.broadcast(&Message::Move { mv, player: seat });

                match referee.outcome(&self.board, self.moves_played) {
                    Some(result) => {
                        self.finish(result);
                        true
                    }
                    None => false,
                }
            }

            other => {
                tracing::debug!(table = %self.id, kind = %other.kind(), "unexpected message dropped");
                false
            }
        }
    }

    fn finish(&mut self, result: GameResult) {
        tracing::info!(table = %self.id, %result, moves = self.moves_played, "game finished");
        self.result = Some(result);
        self.broadcast(&Message::Finish { result });
        for seat in self.seats.iter().flatten() {
            let _ = seat.tx.send(Outbound::Close);
        }
    }

    fn send_to(&self, color: Color, msg: &Message) {
        if let Some(seat) = &self.seats[seat_index(color)] {
            // A closed receiver means the connection task is on its way out.
            let _ = seat.tx.send(Outbound::Frame(msg.encode()));
        }
    }

    fn broadcast(&self, msg: &Message) {
        let bytes = msg.encode();
        for seat in self.seats.iter().flatten() {
            let _ = seat.tx.send(Outbound::Frame(bytes.clone()));
        }
    }

    // -- Accessors --

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The color whose move it is.
    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Number of occupied seats.
    pub fn seated(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn is_full(&self) -> bool {
        self.seated() == self.seats.len()
    }

    /// How long the table has had nobody seated, if it is empty.
    pub fn idle_for(&self) -> Option<Duration> {
        self.idle_since.map(|since| since.elapsed())
    }
}

fn seat_index(color: Color) -> usize {
    usize::from(color.to_byte())
}

// =========================================================================
// Tests
// =========================================================================
