//! Durable storage for the "last active session" pointer.
//!
//! The controller writes a full snapshot of the active session every time it
//! changes, but on startup only the numeric `id` is read back: messages and
//! timestamps are always re-fetched from the service.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::to_writer_pretty;

use crate::error::{Error, Result};
use crate::types::Session;

/// File name used inside the data directory.
pub const STORE_FILE_NAME: &str = "current-session.json";

/// Where the active-session snapshot lives.
pub trait SessionStore: Send + Sync {
    /// Persist a snapshot of `session`, replacing any previous one.
    fn save(&self, session: &Session) -> Result<()>;

    /// The id of the last persisted session, if any.
    fn load_active_id(&self) -> Result<Option<i64>>;

    /// Forget the persisted session.
    fn clear(&self) -> Result<()>;
}

/// The only part of a stored snapshot that is trusted on reload.
#[derive(Deserialize)]
struct SessionPointer {
    id: i64,
}

/// Stores the snapshot as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Use `path` for the snapshot file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default location under the user's data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("chatterbox").join(STORE_FILE_NAME))
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create session store directory", err))?;
        }
        let file = File::create(&self.path)
            .map_err(|err| Error::io("failed to create session store file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, session).map_err(|err| {
            Error::serialization("failed to serialize session snapshot", Some(Box::new(err)))
        })
    }

    fn load_active_id(&self) -> Result<Option<i64>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::io("failed to read session store file", err)),
        };
        let pointer: SessionPointer = serde_json::from_str(&contents).map_err(|err| {
            Error::serialization("failed to parse session snapshot", Some(Box::new(err)))
        })?;
        Ok(Some(pointer.id))
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io("failed to remove session store file", err)),
        }
    }
}

/// Keeps the serialized snapshot in memory.
///
/// The snapshot is stored as JSON text so it goes through the same
/// value-copy round trip as the file store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    snapshot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `session`.
    pub fn with_session(session: &Session) -> Result<Self> {
        let store = Self::new();
        store.save(session)?;
        Ok(store)
    }

    /// A store holding arbitrary snapshot text.
    pub fn with_raw(snapshot: impl Into<String>) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot.into())),
        }
    }

    /// The raw snapshot text, if any.
    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        *self.lock() = Some(json);
        Ok(())
    }

    fn load_active_id(&self) -> Result<Option<i64>> {
        match self.lock().as_deref() {
            Some(json) => {
                let pointer: SessionPointer = serde_json::from_str(json)?;
                Ok(Some(pointer.id))
            }
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}
