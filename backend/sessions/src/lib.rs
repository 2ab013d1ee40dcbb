//! Hosts many Ticket to Ride games at once.
//!
//! The [`registry::SessionRegistry`] maps session IDs to games, serializing actions per
//! session while distinct sessions progress in parallel. After every accepted action the
//! session's snapshot is written to a [`store::SnapshotStore`].

pub mod bot;
pub mod registry;
pub mod store;

pub use registry::{RegistryError, SessionRegistry};
pub use store::{JsonFileStore, MemoryStore, PersistenceError, SessionId, SnapshotStore};
