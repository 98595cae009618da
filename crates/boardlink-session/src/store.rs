//! Persistence seam: where a session keeps what must survive a reload.
//!
//! Three keys, all optional on first run:
//!
//! | key          | value                                   |
//! |--------------|-----------------------------------------|
//! | `session_id` | the id sent in `Init`                   |
//! | `history`    | confirmed moves, oldest first           |
//! | `color`      | the assigned color (0 black, 1 white)   |
//!
//! The [`SessionManager`](crate::SessionManager) is the only writer.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use boardlink_protocol::{Color, Move};

use crate::StoreError;

/// Key-value storage for one client session.
///
/// Missing keys load as `Ok(None)`. Errors are for storage that exists
/// but can't be read or written.
pub trait SessionStore: Send + 'static {
    fn load_session_id(&self) -> Result<Option<String>, StoreError>;
    fn save_session_id(&mut self, id: &str) -> Result<(), StoreError>;

    fn load_history(&self) -> Result<Option<Vec<Move>>, StoreError>;
    fn save_history(&mut self, history: &[Move]) -> Result<(), StoreError>;

    fn load_color(&self) -> Result<Option<Color>, StoreError>;
    fn save_color(&mut self, color: Color) -> Result<(), StoreError>;

    /// Removes all three keys.
    fn clear(&mut self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    session_id: Option<String>,
    history: Option<Vec<Move>>,
    color: Option<Color>,
}

/// An in-process store.
///
/// Clones share the same underlying state, so a test can keep one handle
/// and look at what the session wrote through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with the state locked.
    ///
    /// A poisoned lock only means another thread panicked mid-write; the
    /// plain data inside is still usable.
    fn with<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// `true` if no key is set.
    pub fn is_empty(&self) -> bool {
        self.with(|s| s.session_id.is_none() && s.history.is_none() && s.color.is_none())
    }
}

impl SessionStore for MemoryStore {
    fn load_session_id(&self) -> Result<Option<String>, StoreError> {
        Ok(self.with(|s| s.session_id.clone()))
    }

    fn save_session_id(&mut self, id: &str) -> Result<(), StoreError> {
        self.with(|s| s.session_id = Some(id.to_string()));
        Ok(())
    }

    fn load_history(&self) -> Result<Option<Vec<Move>>, StoreError> {
        Ok(self.with(|s| s.history.clone()))
    }

    fn save_history(&mut self, history: &[Move]) -> Result<(), StoreError> {
        self.with(|s| s.history = Some(history.to_vec()));
        Ok(())
    }

    fn load_color(&self) -> Result<Option<Color>, StoreError> {
        Ok(self.with(|s| s.color))
    }

    fn save_color(&mut self, color: Color) -> Result<(), StoreError> {
        self.with(|s| s.color = Some(color));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.with(|s| *s = MemoryState::default());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

const SESSION_ID_FILE: &str = "session_id";
const HISTORY_FILE: &str = "history.json";
const COLOR_FILE: &str = "color.json";

/// A directory-backed store, one file per key, JSON encoded.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The directory this store writes to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Reads a file, mapping "doesn't exist" to `None`.
    fn read(&self, file: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path(file)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes through a temporary file and a rename, so a crash mid-write
    /// leaves either the old value or the new one.
    fn write(&self, file: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let tmp = self.path(&format!("{file}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, self.path(file))?;
        Ok(())
    }

    fn remove(&self, file: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(file)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for JsonFileStore {
    fn load_session_id(&self) -> Result<Option<String>, StoreError> {
        let Some(bytes) = self.read(SESSION_ID_FILE)? else {
            return Ok(None);
        };
        let id = String::from_utf8(bytes).map_err(|e| StoreError::Corrupt {
            key: "session_id",
            reason: e.to_string(),
        })?;
        let id = id.trim();
        Ok(if id.is_empty() { None } else { Some(id.to_string()) })
    }

    fn save_session_id(&mut self, id: &str) -> Result<(), StoreError> {
        self.write(SESSION_ID_FILE, id.as_bytes())
    }

    fn load_history(&self) -> Result<Option<Vec<Move>>, StoreError> {
        match self.read(HISTORY_FILE)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_history(&mut self, history: &[Move]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(history)?;
        self.write(HISTORY_FILE, &bytes)
    }

    fn load_color(&self) -> Result<Option<Color>, StoreError> {
        let Some(bytes) = self.read(COLOR_FILE)? else {
            return Ok(None);
        };
        let byte: u8 = serde_json::from_slice(&bytes)?;
        Color::from_byte(byte)
            .map(Some)
            .ok_or_else(|| StoreError::Corrupt {
                key: "color",
                reason: format!("unknown color byte {byte}"),
            })
    }

    fn save_color(&mut self, color: Color) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&color.to_byte())?;
        self.write(COLOR_FILE, &bytes)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.remove(SESSION_ID_FILE)?;
        self.remove(HISTORY_FILE)?;
        self.remove(COLOR_FILE)?;
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
