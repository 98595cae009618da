//! The lobby: registry of open tables, and the pairing provisioner.
//!
//! Pairing works on call order. The first `provision()` opens a table
//! under a fresh id and remembers it as *pending*; the next call hands out
//! the same id and clears the slot, so the two callers end up at the same
//! table. The third call starts over with a new table.
//!
//! Tables opened by name with [`Lobby::open_table`] are *standing*: when a
//! game there ends, a fresh table takes its place under the same name.
//! Provisioned tables are forgotten once finished, or once they have sat
//! empty for longer than the idle limit passed to [`Lobby::sweep`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use boardlink_protocol::Color;
use boardlink_session::{Provisioner, SessionError};
use rand::Rng;
use tokio::sync::Mutex;

use crate::Table;

/// Shared handle to one table.
pub type TableHandle = Arc<Mutex<Table>>;

#[derive(Default)]
struct LobbyState {
    tables: HashMap<String, TableHandle>,
    pending: Option<String>,
    standing: HashSet<String>,
}

/// All open tables, keyed by session id.
pub struct Lobby {
    state: Mutex<LobbyState>,
    first_to_move: Color,
}

impl Lobby {
    /// Creates an empty lobby whose tables start with `first_to_move`.
    pub fn new(first_to_move: Color) -> Self {
        Self {
            state: Mutex::new(LobbyState::default()),
            first_to_move,
        }
    }

    /// Opens a standing table under `id`, or returns the one already there.
    ///
    /// A finished table under `id` is replaced with a fresh one.
    pub async fn open_table(&self, id: impl Into<String>) -> TableHandle {
        let id = id.into();
        let mut state = self.state.lock().await;
        state.standing.insert(id.clone());

        if let Some(existing) = state.tables.get(&id) {
            let finished = existing
                .try_lock()
                .map(|table| table.is_finished())
                .unwrap_or(false);
            if !finished {
                return Arc::clone(existing);
            }
        }

        let table = self.fresh_table(&id);
        state.tables.insert(id.clone(), Arc::clone(&table));
        tracing::info!(table = %id, "table opened");
        table
    }

    /// Retires a table whose game has ended.
    ///
    /// A standing table is reset to a fresh game under the same id; any
    /// other table is forgotten.
    pub async fn retire(&self, id: &str) {
        let mut state = self.state.lock().await;
        if state.standing.contains(id) {
            let table = self.fresh_table(id);
            state.tables.insert(id.to_string(), table);
            tracing::info!(table = %id, "standing table reset");
        } else {
            forget(&mut state, id);
        }
    }

    /// Drops tables that have had nobody seated for at least `max_idle`.
    ///
    /// Standing tables are reset instead of dropped, and only once a move
    /// has been played there. Returns how many tables were affected.
    pub async fn sweep(&self, max_idle: Duration) -> usize {
        let mut state = self.state.lock().await;

        let mut expired = Vec::new();
        for (id, handle) in &state.tables {
            // A locked table is in use, so it isn't idle.
            let Ok(table) = handle.try_lock() else {
                continue;
            };
            let idle = table.idle_for().is_some_and(|d| d >= max_idle);
            let standing = state.standing.contains(id);
            if idle && (!standing || table.moves_played() > 0) {
                expired.push(id.clone());
            }
        }

        for id in &expired {
            if state.standing.contains(id) {
                let table = self.fresh_table(id);
                state.tables.insert(id.clone(), table);
                tracing::info!(table = %id, "idle standing table reset");
            } else {
                forget(&mut state, id);
            }
        }
        expired.len()
    }

    fn fresh_table(&self, id: &str) -> TableHandle {
        Arc::new(Mutex::new(Table::new(id, self.first_to_move)))
    }

    /// The table for `id`, if it is open.
    pub async fn table(&self, id: &str) -> Option<TableHandle> {
        self.state.lock().await.tables.get(id).cloned()
    }

    /// Forgets the table for `id`, standing or not.
    pub async fn remove(&self, id: &str) {
        let mut state = self.state.lock().await;
        state.standing.remove(id);
        forget(&mut state, id);
    }

    /// Number of open tables.
    pub async fn len(&self) -> usize {
        self.state.lock().await.tables.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Provisioner for Lobby {
    async fn provision(&self) -> Result<String, SessionError> {
        let mut state = self.state.lock().await;

        if let Some(id) = state.pending.take() {
            tracing::debug!(table = %id, "paired with pending table");
            return Ok(id);
        }

        let id = generate_session_id();
        let table = Table::new(id.clone(), self.first_to_move);
        state.tables.insert(id.clone(), Arc::new(Mutex::new(table)));
        state.pending = Some(id.clone());
        tracing::info!(table = %id, "table opened, waiting for a partner");
        Ok(id)
    }
}

fn forget(state: &mut LobbyState, id: &str) {
    if state.tables.remove(id).is_some() {
        tracing::info!(table = %id, "table removed");
    }
    if state.pending.as_deref() == Some(id) {
        state.pending = None;
    }
}

/// 128 random bits as 32 lowercase hex characters.
fn generate_session_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
