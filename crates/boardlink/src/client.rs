//! Client runtime: one session, one socket, one renderer.
//!
//! [`Client::run`] drives a [`SessionManager`] from two sources, socket
//! frames and local input events, handling each to completion before the
//! next. Whatever should be on screen is pushed through a [`Renderer`].
//!
//! ```text
//!  inputs ──► handle_input ──► proposal ──► socket
//!  socket ──► handle_bytes ──► event ─────► renderer
//! ```

use boardlink_game::{InputEvent, Placement, SelectionState};
use boardlink_protocol::{Color, Field, GameResult, Message};
use boardlink_session::{
    FixedProvisioner, Provisioner, SessionEvent, SessionManager, SessionStore,
};
use boardlink_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::BoardlinkError;

/// Presentation hook for the client.
///
/// Only [`repaint`](Self::repaint) is required. It is called with the full
/// board every time something visible changed.
pub trait Renderer {
    /// Draws the board with `highlights` marked as move targets.
    fn repaint(&mut self, board: &[Placement], highlights: &[Field]);

    /// The server assigned our color.
    fn assigned(&mut self, _color: Color) {}

    /// The game ended.
    fn finished(&mut self, _result: GameResult) {}
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay endpoint.
    pub url: String,
    /// Session id to join when none is stored. Takes precedence over the
    /// provisioner.
    pub session_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000/ws".to_string(),
            session_id: None,
        }
    }
}

/// Builder for a [`Client`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relay URL.
    pub fn url(mut self, url: &str) -> Self {
        self.config.url = url.to_string();
        self
    }

    /// Joins this session id instead of asking the provisioner.
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.config.session_id = Some(id.into());
        self
    }

    /// Restores the session from `store` and returns a client ready to run.
    pub fn build<S, P>(self, store: S, provisioner: P) -> Client<S, P>
    where
        S: SessionStore,
        P: Provisioner,
    {
        Client {
            config: self.config,
            session: SessionManager::restore(store),
            provisioner,
        }
    }
}

/// A game client bound to one session.
pub struct Client<S: SessionStore, P: Provisioner> {
    config: ClientConfig,
    session: SessionManager<S>,
    provisioner: P,
}

impl<S: SessionStore, P: Provisioner> Client<S, P> {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The session being driven.
    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    /// Runs the session until the game finishes or the connection ends.
    ///
    /// Returns the result if a `Finish` was received, `None` if the socket
    /// or the input channel closed first. Undecodable frames and protocol
    /// violations are logged and skipped.
    ///
    /// # Errors
    /// Fails if no session id can be obtained or the relay can't be reached.
    pub async fn run<Re: Renderer>(
        &mut self,
        renderer: &mut Re,
        mut inputs: mpsc::UnboundedReceiver<InputEvent>,
    ) -> Result<Option<GameResult>, BoardlinkError> {
        let session_id = match &self.config.session_id {
            Some(id) => {
                self.session
                    .session_id(&FixedProvisioner::new(id.clone()))
                    .await?
            }
            None => self.session.session_id(&self.provisioner).await?,
        };

        let mut highlights: Vec<Field> = Vec::new();
        renderer.repaint(&self.session.snapshot(), &highlights);
        if let Some(color) = self.session.color() {
            renderer.assigned(color);
        }

        let conn = WebSocketConnection::connect(&self.config.url).await?;
        tracing::info!(url = %self.config.url, session = %session_id, "connected");
        send(&conn, &Message::Init { session_id }).await;

        loop {
            tokio::select! {
                inbound = conn.recv() => {
                    let data = match inbound {
                        Ok(Some(data)) => data,
                        Ok(None) => {
                            tracing::info!("connection closed by server");
                            return Ok(None);
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "recv failed");
                            return Ok(None);
                        }
                    };

                    match self.session.handle_bytes(&data) {
                        Ok(SessionEvent::Assigned(color)) => renderer.assigned(color),
                        Ok(SessionEvent::Moved { .. }) => {
                            highlights.clear();
                            renderer.repaint(&self.session.snapshot(), &highlights);
                        }
                        Ok(SessionEvent::Highlight(fields)) => {
                            // A hint for a selection we already left is stale.
                            if matches!(self.session.selection(), SelectionState::Selecting { .. }) {
                                highlights = fields;
                                renderer.repaint(&self.session.snapshot(), &highlights);
                            }
                        }
                        Ok(SessionEvent::Finished(result)) => {
                            renderer.finished(result);
                            let _ = conn.close().await;
                            return Ok(Some(result));
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "server message ignored");
                        }
                    }
                }

                event = inputs.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("input channel closed");
                        let _ = conn.close().await;
                        return Ok(None);
                    };

                    let before = self.session.selection();
                    if let Some(msg) = self.session.handle_input(event) {
                        send(&conn, &msg).await;
                    }
                    if self.session.selection() != before && !highlights.is_empty() {
                        highlights.clear();
                        renderer.repaint(&self.session.snapshot(), &highlights);
                    }
                }
            }
        }
    }
}

/// Sends `msg`, dropping it if the connection can't take it.
async fn send(conn: &WebSocketConnection, msg: &Message) {
    if let Err(e) = conn.send(&msg.encode()).await {
        tracing::debug!(kind = %msg.kind(), error = %e, "message dropped, connection not open");
    }
}
