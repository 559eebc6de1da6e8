use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-user turn serialization.
///
/// The gateway gives no ordering promise for near-simultaneous messages from
/// one chat, and a turn is a read-check-write sequence over the profile and
/// the sender's balance. Locking the sender's lane for the whole turn keeps
/// those sequences from interleaving. Different users never contend.
pub struct SessionLaneManager {
    lanes: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLaneManager {
    pub fn new() -> Self {
        Self {
            lanes: DashMap::new(),
        }
    }

    pub fn lane(&self, handle: &str) -> Arc<Mutex<()>> {
        self.lanes
            .entry(handle.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for SessionLaneManager {
    fn default() -> Self {
        Self::new()
    }
}
