//! The session manager: one client's view of one game.
//!
//! It owns everything a client has to remember between messages:
//! - The local board mirror and the confirmed move history
//! - The pending selection, if any
//! - The assigned color and the session id
//! - Whether the game has finished
//!
//! and keeps the persistent subset of that in a [`SessionStore`] so a
//! reload can pick the game back up.
//!
//! # Lifecycle
//!
//! ```text
//! restore() ──→ session_id() ──→ Init sent
//!                                    │
//!      ┌──────── handle_message() ◄──┘
//!      │   Assign / Move / Hint update state
//!      ▼
//!   Finish ──→ [Terminal]  store cleared, id forgotten
//! ```
//!
//! # Authority
//!
//! The board only changes when the server echoes a `Move`. Local input
//! produces *proposals* ([`handle_input`](SessionManager::handle_input));
//! nothing is applied until the confirmation comes back.

use boardlink_game::{Board, InputEvent, Piece, Placement, Selection, SelectionState};
use boardlink_protocol::{Color, Field, GameResult, Message, Move};

use crate::{Provisioner, SessionError, SessionStore};

/// What a server message did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server told us which side we're playing.
    Assigned(Color),

    /// A confirmed move was applied to the board.
    Moved {
        mv: Move,
        player: Color,
        /// The piece that was on the destination of a `Replace`, if any.
        captured: Option<Piece>,
    },

    /// Fields to highlight as destinations for the pending selection.
    Highlight(Vec<Field>),

    /// The game is over.
    Finished(GameResult),
}

/// Client-side state for a single game session.
pub struct SessionManager<S: SessionStore> {
    store: S,
    board: Board,
    selection: Selection,
    history: Vec<Move>,
    color: Option<Color>,
    session_id: Option<String>,
    result: Option<GameResult>,
}

impl<S: SessionStore> SessionManager<S> {
    /// Rebuilds a session from whatever `store` remembers.
    ///
    /// The board is the starting position with the stored history replayed
    /// on top. If the history doesn't replay cleanly it is discarded and the
    /// board starts fresh. Store read failures are logged and treated as
    /// "nothing stored".
    pub fn restore(store: S) -> Self {
        let session_id = store.load_session_id().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load session id");
            None
        });
        let color = store.load_color().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load assigned color");
            None
        });
        let stored = store.load_history().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load move history");
            None
        });

        let mut manager = Self {
            store,
            board: Board::new(),
            selection: Selection::new(),
            history: Vec::new(),
            color,
            session_id,
            result: None,
        };

        if let Some(history) = stored {
            match Board::replay(&history) {
                Ok(board) => {
                    tracing::info!(moves = history.len(), "restored move history");
                    manager.board = board;
                    manager.history = history;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stored history is inconsistent, starting fresh");
                    manager.persist_history();
                }
            }
        }

        manager
    }

    /// Returns the session id, asking `provisioner` for one if none is known.
    ///
    /// A freshly provisioned id is persisted. The provisioner is not called
    /// again while an id is cached.
    pub async fn session_id(
        &mut self,
        provisioner: &impl Provisioner,
    ) -> Result<String, SessionError> {
        if let Some(id) = &self.session_id {
            return Ok(id.clone());
        }

        let id = provisioner.provision().await?;
        tracing::info!(session = %id, "session id provisioned");
        if let Err(e) = self.store.save_session_id(&id) {
            tracing::warn!(error = %e, "could not persist session id");
        }
        self.session_id = Some(id.clone());
        Ok(id)
    }

    /// The `Init` message for the current session id, if one is known.
    pub fn init_message(&self) -> Option<Message> {
        self.session_id.as_ref().map(|id| Message::Init {
            session_id: id.clone(),
        })
    }

    /// Feeds a local input event through the selection machine.
    ///
    /// Returns the proposal to send, if any. Nothing happens once the game
    /// is finished.
    pub fn handle_input(&mut self, event: InputEvent) -> Option<Message> {
        if self.is_terminal() {
            return None;
        }
        self.selection.handle(event, &self.board, self.color)
    }

    /// Decodes a received buffer and applies it.
    pub fn handle_bytes(&mut self, data: &[u8]) -> Result<SessionEvent, SessionError> {
        let msg = Message::decode(data)?;
        self.handle_message(msg)
    }

    /// Applies one server message.
    ///
    /// On error the session is unchanged.
    pub fn handle_message(&mut self, msg: Message) -> Result<SessionEvent, SessionError> {
        let kind = msg.kind();
        if !kind.direction().reaches_client() {
            return Err(SessionError::Misdirected(kind));
        }
        if self.is_terminal() {
            return Err(SessionError::Terminal(kind));
        }

        match msg {
            Message::Assign { color } => {
                if self.color.is_some_and(|prev| prev != color) {
                    tracing::warn!(%color, "server changed our assigned color");
                }
                self.color = Some(color);
                if let Err(e) = self.store.save_color(color) {
                    tracing::warn!(error = %e, "could not persist assigned color");
                }
                tracing::info!(%color, "color assigned");
                Ok(SessionEvent::Assigned(color))
            }

            Message::Move { mv, player } => {
                let captured = self.board.apply_move(&mv)?;
                self.history.push(mv);
                self.persist_history();
                tracing::debug!(%mv, %player, captured = captured.is_some(), "move applied");

                // The opponent may have moved or taken the piece we had selected.
                if let Some(src) = self.selection.pending() {
                    if self.board.color_at(src) != self.color {
                        self.selection.cancel();
                    }
                }

                Ok(SessionEvent::Moved {
                    mv,
                    player,
                    captured,
                })
            }

            Message::Hint { fields } => Ok(SessionEvent::Highlight(fields)),

            Message::Finish { result } => {
                tracing::info!(%result, moves = self.history.len(), "game finished");
                self.result = Some(result);
                self.selection.cancel();
                self.session_id = None;
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "could not clear session store");
                }
                Ok(SessionEvent::Finished(result))
            }

            // Client-to-server kinds were rejected above.
            Message::Init { .. } | Message::HintRequest { .. } => {
                Err(SessionError::Misdirected(kind))
            }
        }
    }

    fn persist_history(&mut self) {
        if let Err(e) = self.store.save_history(&self.history) {
            tracing::warn!(error = %e, "could not persist move history");
        }
    }

    // -- Accessors --

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Every occupied field with its piece color.
    pub fn snapshot(&self) -> Vec<Placement> {
        self.board.snapshot()
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Confirmed moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn moves_played(&self) -> usize {
        self.history.len()
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// `true` once a `Finish` has been received.
    pub fn is_terminal(&self) -> bool {
        self.result.is_some()
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    /// The cached session id, without provisioning.
    pub fn cached_session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

// =========================================================================
// Tests
// =========================================================================
