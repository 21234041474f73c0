//! Authoritative in-memory positions of every registered client
//!
//! The store is the only state shared between handler tasks. Every operation
//! takes the same exclusive lock for its whole duration, so a write is never
//! observed half-applied and concurrent writes to different ids are never lost.
//! Entries are never removed; they live as long as the server process.

use shared::{ClientId, Coordinate};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared mapping from client id to last known coordinate
///
/// Cloning is cheap and every clone refers to the same underlying map, which is
/// how each spawned handler task gets its handle on the store.
#[derive(Debug, Clone, Default)]
pub struct PositionStore {
    positions: Arc<Mutex<HashMap<ClientId, Coordinate>>>,
}

impl PositionStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the coordinate for `id`
    pub async fn set(&self, id: ClientId, coord: Coordinate) {
        self.positions.lock().await.insert(id, coord);
    }

    /// Adds `id` at the origin unless it is already present
    ///
    /// Returns false, leaving the existing entry untouched, when the id was
    /// already registered. The check and the insert happen under one lock, so
    /// two racing handshakes for the same id cannot both succeed.
    pub async fn register(&self, id: ClientId) -> bool {
        let mut positions = self.positions.lock().await;
        if positions.contains_key(&id) {
            return false;
        }
        positions.insert(id, Coordinate::ORIGIN);
        true
    }

    /// Returns true if `id` has registered or reported a position
    pub async fn contains(&self, id: ClientId) -> bool {
        self.positions.lock().await.contains_key(&id)
    }

    pub async fn get(&self, id: ClientId) -> Option<Coordinate> {
        self.positions.lock().await.get(&id).copied()
    }

    /// Snapshot of every entry taken within a single exclusive section
    ///
    /// Order follows the map's iteration order and carries no meaning.
    pub async fn get_all(&self) -> Vec<(ClientId, Coordinate)> {
        self.positions
            .lock()
            .await
            .iter()
            .map(|(id, coord)| (*id, *coord))
            .collect()
    }

    /// Returns the number of registered clients
    pub async fn len(&self) -> usize {
        self.positions.lock().await.len()
    }

    /// Returns true if no client has registered yet
    pub async fn is_empty(&self) -> bool {
        self.positions.lock().await.is_empty()
    }
}
