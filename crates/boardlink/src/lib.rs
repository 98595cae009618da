//! # Boardlink
//!
//! Client and relay server for two-player board games over WebSockets.
//!
//! The client never decides what is legal. It turns clicks into proposals,
//! sends them, and mirrors on its board whatever the relay confirms. The
//! relay seats two players per table, checks turns, and asks a
//! [`Referee`](boardlink_game::Referee) about everything else. It can also
//! serve an HTTP pairing endpoint that hands two clients the same session
//! id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boardlink::prelude::*;
//!
//! # async fn start() -> Result<(), BoardlinkError> {
//! boardlink::init_tracing();
//!
//! let server = ServerBuilder::new()
//!     .bind("127.0.0.1:8000")
//!     .pairing("127.0.0.1:8001")
//!     .build(FreeplayReferee::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod client;
mod error;
mod handler;
mod lobby;
mod pairing;
mod server;
mod table;

pub use client::{Client, ClientBuilder, ClientConfig, Renderer};
pub use error::{BoardlinkError, TableError};
pub use lobby::{Lobby, TableHandle};
pub use server::{Server, ServerBuilder, ServerConfig};
pub use table::{Outbound, Table};

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG`.
///
/// Defaults to `info` when `RUST_LOG` is unset or invalid. Calling it a
/// second time does nothing.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Everything needed to run a client or a relay.
pub mod prelude {
    pub use crate::{
        BoardlinkError, Client, ClientBuilder, ClientConfig, Lobby, Renderer, Server,
        ServerBuilder, ServerConfig,
    };
    pub use boardlink_game::{
        Board, Button, FreeplayReferee, InputEvent, Piece, Placement, Referee, SelectionState,
    };
    pub use boardlink_protocol::{Action, Color, Field, GameResult, Message, Move};
    pub use boardlink_session::{
        FixedProvisioner, HttpProvisioner, JsonFileStore, MemoryStore, Provisioner,
        SessionError, SessionEvent, SessionManager, SessionStore,
    };
}
