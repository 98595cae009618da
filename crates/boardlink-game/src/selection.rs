//! The selection state machine: clicks in, protocol messages out.
//!
//! ```text
//!                 primary on own piece
//!                 ── emit HintRequest ──▶
//!          Idle                            Selecting(src)
//!                 ◀── primary elsewhere ──
//!                     emit Move
//!                 ◀── secondary (cancel) ─
//!                 ◀── primary on src ─────
//! ```
//!
//! The machine only proposes. It reads the board to classify a click but
//! never writes to it: the board changes when the server echoes a `Move`
//! back, which keeps the client a mirror of server-confirmed state.

use boardlink_protocol::{Action, Color, Field, Message, Move};

use crate::Board;

/// Which button produced an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Select a piece, or pick the destination for the selected one.
    Primary,
    /// Cancel the current selection.
    Secondary,
    /// Any other button. Ignored.
    Auxiliary,
}

/// A discrete input: a button pressed over a board field.
///
/// Converting pointer coordinates into a field is the input source's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub button: Button,
    pub field: Field,
}

impl InputEvent {
    pub fn primary(field: Field) -> Self {
        Self {
            button: Button::Primary,
            field,
        }
    }

    pub fn secondary(field: Field) -> Self {
        Self {
            button: Button::Secondary,
            field,
        }
    }
}

/// The two states of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    /// Nothing selected. Initial and resting state.
    #[default]
    Idle,
    /// A piece on `src` is selected; waiting for a destination or a cancel.
    Selecting { src: Field },
}

/// Holds the single pending selection.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    state: SelectionState,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// The selected source field, if any.
    pub fn pending(&self) -> Option<Field> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::Selecting { src } => Some(src),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == SelectionState::Idle
    }

    /// Drops any pending selection.
    pub fn cancel(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Feeds one input event through the machine.
    ///
    /// `player` is the local color, or `None` before the server assigned
    /// one (in which case nothing can be selected). Returns the message to
    /// send, if the event produced one.
    pub fn handle(
        &mut self,
        event: InputEvent,
        board: &Board,
        player: Option<Color>,
    ) -> Option<Message> {
        match (self.state, event.button) {
            (_, Button::Auxiliary) => None,

            (SelectionState::Idle, Button::Secondary) => None,

            (SelectionState::Selecting { src }, Button::Secondary) => {
                tracing::debug!(%src, "selection cancelled");
                self.state = SelectionState::Idle;
                None
            }

            (SelectionState::Idle, Button::Primary) => {
                let player = player?;
                if board.color_at(event.field) != Some(player) {
                    return None;
                }
                tracing::debug!(src = %event.field, "piece selected");
                self.state = SelectionState::Selecting { src: event.field };
                Some(Message::HintRequest {
                    src: event.field,
                    player,
                })
            }

            (SelectionState::Selecting { src }, Button::Primary) => {
                self.state = SelectionState::Idle;

                // Clicking the selected piece again deselects it.
                if event.field == src {
                    tracing::debug!(%src, "selection released on source");
                    return None;
                }
                let player = player?;

                let dst = event.field;
                let action = if board.color_at(dst) == Some(player) {
                    Action::Swap
                } else {
                    Action::Replace
                };
                let mv = Move::new(src, dst, action);
                tracing::debug!(%mv, "move proposed");
                Some(Message::Move { mv, player })
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
