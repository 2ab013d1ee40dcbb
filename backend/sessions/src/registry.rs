//! Owns every live session, and persists each of them after every action.

use crate::store::{PersistenceError, SessionId, SnapshotStore};

use dashmap::DashMap;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use uuid::Uuid;

use ticket_to_ride_engine::action::{Action, ActionOutcome};
use ticket_to_ride_engine::error::EngineError;
use ticket_to_ride_engine::player::PlayerId;
use ticket_to_ride_engine::session::{GameConfig, GameSession};

/// Types of error when acting on a session through the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Session {0} does not exist.")]
    SessionNotFound(SessionId),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl RegistryError {
    /// Whether the action was merely refused, leaving the session as it was.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RegistryError::Engine(e) if e.is_recoverable())
    }
}

/// Maps a session ID to its game, behind one lock per session.
///
/// Actions on different sessions run in parallel, while actions on the same session
/// are serialized. Every action is bracketed by the store: the session is loaded if it
/// is not in memory, mutated, then saved.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Mutex<GameSession>>>,
    store: Box<dyn SnapshotStore>,
}

impl SessionRegistry {
    pub fn new(store: Box<dyn SnapshotStore>) -> Self {
        Self {
            sessions: DashMap::new(),
            store,
        }
    }

    /// Deals a new game, saves it, and returns its ID.
    pub fn create(
        &self,
        names: Vec<String>,
        config: GameConfig,
    ) -> Result<SessionId, RegistryError> {
        let session = GameSession::new(names, config)?;
        let id = Uuid::new_v4();

        self.store.save(&id, &session.snapshot())?;
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        info!("Created session {}", id);

        Ok(id)
    }

    /// Plays `action` in the session, then saves it.
    ///
    /// Refused actions change nothing and are not saved. A session hitting a broken
    /// invariant, or whose snapshot could not be saved, is dropped from memory, so the
    /// next access reloads its last snapshot.
    pub fn apply(
        &self,
        id: &SessionId,
        player_id: PlayerId,
        action: Action,
    ) -> Result<ActionOutcome, RegistryError> {
        let session = self.resident(id)?;
        let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);

        match session.apply(player_id, action) {
            Ok(outcome) => match self.store.save(id, &session.snapshot()) {
                Ok(()) => Ok(outcome),
                Err(e) => {
                    // Memory is ahead of the store: fall back to the last saved snapshot.
                    warn!("Evicting session {} after a failed save: {}", id, e);
                    drop(session);
                    self.sessions.remove(id);
                    Err(e.into())
                }
            },
            Err(e) if e.is_recoverable() => Err(e.into()),
            Err(e) => {
                warn!("Evicting session {}: {}", id, e);
                drop(session);
                self.sessions.remove(id);
                Err(e.into())
            }
        }
    }

    /// Runs `f` on the session, without saving it afterwards.
    pub fn with_session<R, F: FnOnce(&GameSession) -> R>(
        &self,
        id: &SessionId,
        f: F,
    ) -> Result<R, RegistryError> {
        let session = self.resident(id)?;
        let session = session.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(f(&session))
    }

    /// Drops the in-memory copy of the session. Its snapshot stays in the store.
    pub fn evict(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn is_resident(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Number of sessions in memory.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// The session, loaded from the store if it is not in memory yet.
    fn resident(&self, id: &SessionId) -> Result<Arc<Mutex<GameSession>>, RegistryError> {
        if let Some(session) = self.sessions.get(id) {
            return Ok(session.value().clone());
        }

        let snapshot = self
            .store
            .load(id)
            .ok_or(RegistryError::SessionNotFound(*id))?;
        debug!("Loaded session {} from its snapshot", id);

        Ok(self
            .sessions
            .entry(*id)
            .or_insert_with(|| Arc::new(Mutex::new(GameSession::restore(snapshot))))
            .value()
            .clone())
    }
}
