//! Where session snapshots are kept between actions.

use dashmap::DashMap;
use log::warn;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use ticket_to_ride_engine::session::Snapshot;

/// Identifies a session across the registry and its store.
pub type SessionId = Uuid;

/// Types of error when persisting a snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persistence of snapshots, one per session. The last successful save wins.
pub trait SnapshotStore: Send + Sync {
    /// The last snapshot saved for `id`, if any could be read back.
    fn load(&self, id: &SessionId) -> Option<Snapshot>;

    fn save(&self, id: &SessionId, snapshot: &Snapshot) -> Result<(), PersistenceError>;
}

/// Keeps snapshots as JSON strings in memory.
#[derive(Default)]
pub struct MemoryStore {
    snapshots: DashMap<SessionId, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, id: &SessionId) -> Option<Snapshot> {
        let json = self.snapshots.get(id)?;

        match serde_json::from_str(json.value()) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Could not read the snapshot of session {}: {}", id, e);
                None
            }
        }
    }

    fn save(&self, id: &SessionId, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(snapshot)?;
        self.snapshots.insert(*id, json);
        Ok(())
    }
}

/// One `<session id>.json` file per session, in a single directory.
///
/// Snapshots are written to a temporary file first, then renamed over the previous one,
/// so a crash mid-write never leaves a truncated snapshot behind.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Uses `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn path_of(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, id: &SessionId) -> Option<Snapshot> {
        let path = self.path_of(id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Could not parse {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save(&self, id: &SessionId, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let temporary = self.dir.join(format!("{}.json.tmp", id));
        fs::write(&temporary, serde_json::to_vec(snapshot)?)?;
        fs::rename(&temporary, self.path_of(id))?;

        Ok(())
    }
}
