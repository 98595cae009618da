//! Per-connection handler: Init, seating, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Wait for `Init` → look up the table for its session id
//!   2. Take a seat → the table sends `Assign`
//!   3. Loop: socket frames go to the table, table frames go to the socket
//!   4. Vacate the seat, then close

use std::sync::Arc;
use std::time::Duration;

use boardlink_game::Referee;
use boardlink_protocol::Message;
use boardlink_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::lobby::TableHandle;
use crate::server::ServerState;
use crate::table::Outbound;
use crate::BoardlinkError;

/// Vacates the seat if the handler never reaches its own `leave`, e.g.
/// when the task is aborted.
///
/// `Drop` is synchronous, so the async lock happens in a spawned task. The
/// normal exit path vacates the seat itself and disarms the guard.
struct SeatGuard {
    conn: ConnectionId,
    table: TableHandle,
    armed: bool,
}

impl SeatGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SeatGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let conn = self.conn;
        let table = Arc::clone(&self.table);
        tokio::spawn(async move {
            table.lock().await.leave(conn);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<R: Referee>(
    conn: WebSocketConnection,
    state: Arc<ServerState<R>>,
) -> Result<(), BoardlinkError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Init ---
    let session_id = match await_init(&conn, state.config.init_timeout).await {
        Ok(id) => id,
        Err(e) => {
            let _ = conn.close().await;
            return Err(e);
        }
    };

    let Some(table) = state.lobby.table(&session_id).await else {
        tracing::info!(%conn_id, session = %session_id, "unknown session, closing");
        let _ = conn.close().await;
        return Err(BoardlinkError::UnknownSession(session_id));
    };

    // --- Step 2: Seat ---
    let (tx, mut rx) = mpsc::unbounded_channel();
    let joined = table.lock().await.join(conn_id, tx);
    let color = match joined {
        Ok(color) => color,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "seat refused, closing");
            let _ = conn.close().await;
            return Err(e.into());
        }
    };
    let mut guard = SeatGuard {
        conn: conn_id,
        table: Arc::clone(&table),
        armed: true,
    };
    tracing::info!(%conn_id, session = %session_id, %color, "player seated");

    // --- Step 3: Relay loop ---
    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    let msg = match Message::decode(&data) {
                        Ok(msg) => msg,
                        Err(e) => {
                            tracing::debug!(%conn_id, error = %e, "undecodable frame dropped");
                            continue;
                        }
                    };
                    let finished = table.lock().await.handle(color, msg, &state.referee);
                    if finished {
                        state.lobby.retire(&session_id).await;
                    }
                }
                Ok(None) => {
                    tracing::info!(%conn_id, %color, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },

            outbound = rx.recv() => match outbound {
                Some(Outbound::Frame(bytes)) => {
                    if let Err(e) = conn.send(&bytes).await {
                        tracing::debug!(%conn_id, error = %e, "send failed");
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    tracing::debug!(%conn_id, "table closed the seat");
                    break;
                }
            },
        }
    }

    // The seat is free before the peer sees the close, so an immediate
    // reconnect finds it vacant.
    table.lock().await.leave(conn_id);
    guard.disarm();
    let _ = conn.close().await;
    Ok(())
}

/// Waits up to `timeout` for the connection's `Init`.
async fn await_init(
    conn: &WebSocketConnection,
    timeout: Duration,
) -> Result<String, BoardlinkError> {
    match tokio::time::timeout(timeout, read_init(conn)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::info!(conn_id = %conn.id(), "no Init in time");
            Err(BoardlinkError::InitTimeout(timeout))
        }
    }
}

/// Reads frames until one is an `Init` and returns its session id.
///
/// Anything received before `Init`, valid or not, is ignored.
async fn read_init(conn: &WebSocketConnection) -> Result<String, BoardlinkError> {
    let conn_id = conn.id();
    loop {
        let Some(data) = conn.recv().await? else {
            return Err(BoardlinkError::ClosedBeforeInit);
        };
        match Message::decode(&data) {
            Ok(Message::Init { session_id }) => return Ok(session_id),
            Ok(other) => {
                tracing::debug!(%conn_id, kind = %other.kind(), "ignored before Init");
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "undecodable frame before Init");
            }
        }
    }
}
