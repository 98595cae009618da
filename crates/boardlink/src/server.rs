//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Boardlink relay. It ties the
//! layers together: transport → protocol → lobby/table → referee.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use boardlink_game::Referee;
use boardlink_protocol::Color;
use boardlink_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;

use crate::BoardlinkError;
use crate::handler::handle_connection;
use crate::lobby::Lobby;
use crate::pairing;

/// Relay server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,
    /// How long a new connection may take to send `Init`.
    pub init_timeout: Duration,
    /// Color handed to the first joiner at each table, and the one to move
    /// first.
    pub first_to_move: Color,
    /// Where to serve the HTTP pairing endpoint (`GET /game`), if anywhere.
    pub pairing_addr: Option<String>,
    /// How long a table may sit with nobody seated before it is dropped.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            init_timeout: Duration::from_secs(10),
            first_to_move: Color::White,
            pairing_addr: None,
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<R: Referee> {
    pub(crate) lobby: Arc<Lobby>,
    pub(crate) referee: R,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,no_run
/// use boardlink::prelude::*;
///
/// # async fn start() -> Result<(), BoardlinkError> {
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:8000")
///     .build(FreeplayReferee::new())
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a connection may wait before sending `Init`.
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.config.init_timeout = timeout;
        self
    }

    /// Sets the color that moves first (and is handed to the first joiner).
    pub fn first_to_move(mut self, color: Color) -> Self {
        self.config.first_to_move = color;
        self
    }

    /// Serves the HTTP pairing endpoint on `addr`.
    pub fn pairing(mut self, addr: &str) -> Self {
        self.config.pairing_addr = Some(addr.to_string());
        self
    }

    /// Sets how long an empty table is kept.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and returns a server ready to [`run`](Server::run).
    pub async fn build<R: Referee>(self, referee: R) -> Result<Server<R>, BoardlinkError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let pairing = match &self.config.pairing_addr {
            Some(addr) => Some(
                TcpListener::bind(addr)
                    .await
                    .map_err(BoardlinkError::Pairing)?,
            ),
            None => None,
        };

        let state = Arc::new(ServerState {
            lobby: Arc::new(Lobby::new(self.config.first_to_move)),
            referee,
            config: self.config,
        });

        Ok(Server {
            transport,
            pairing,
            state,
        })
    }
}

/// A bound relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<R: Referee> {
    transport: WebSocketTransport,
    pairing: Option<TcpListener>,
    state: Arc<ServerState<R>>,
}

impl<R: Referee> Server<R> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Address of the pairing endpoint, if one is served.
    pub fn pairing_addr(&self) -> Option<SocketAddr> {
        self.pairing.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// The lobby, for provisioning session ids or opening named tables.
    pub fn lobby(&self) -> Arc<Lobby> {
        Arc::clone(&self.state.lobby)
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own task. The pairing endpoint and
    /// the idle-table sweep run alongside. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), BoardlinkError> {
        tracing::info!(addr = %self.state.config.bind_addr, "boardlink relay running");

        if let Some(listener) = self.pairing.take() {
            let router = pairing::router(Arc::clone(&self.state.lobby));
            tracing::info!(addr = ?listener.local_addr().ok(), "pairing endpoint running");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, router).await {
                    tracing::error!(error = %e, "pairing endpoint stopped");
                }
            });
        }
        tokio::spawn(sweep_idle_tables(
            Arc::clone(&self.state.lobby),
            self.state.config.idle_timeout,
        ));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Periodically drops tables that nobody has sat at for `max_idle`.
async fn sweep_idle_tables(lobby: Arc<Lobby>, max_idle: Duration) {
    let mut ticker = tokio::time::interval(max_idle.max(Duration::from_secs(1)));
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let swept = lobby.sweep(max_idle).await;
        if swept > 0 {
            tracing::debug!(swept, "idle tables swept");
        }
    }
}
