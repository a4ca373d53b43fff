//! The single active-spawn slot.
//!
//! Writers are the spawner (fill when empty), the coordinator (take on first
//! attempt) and the flee timer (take on timeout). Both takers name the spawn
//! they expect, so whichever comes second finds a different spawn or none and
//! does nothing. A spawn is therefore cleared exactly once.

use tokio::sync::RwLock;
use wordmon_domain::SpawnId;

use super::types::ActiveSpawn;

#[derive(Default)]
pub struct ActiveSpawnSlot {
    inner: RwLock<Option<ActiveSpawn>>,
}

impl ActiveSpawnSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<ActiveSpawn> {
        self.inner.read().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_none()
    }

    /// Install `spawn` if nothing is active. Returns whether it was installed.
    pub async fn try_fill(&self, spawn: ActiveSpawn) -> bool {
        let mut slot = self.inner.write().await;
        if slot.is_some() {
            return false;
        }
        *slot = Some(spawn);
        true
    }

    /// Clear the slot if it still holds `spawn_id`, returning what was held.
    pub async fn take_if(&self, spawn_id: SpawnId) -> Option<ActiveSpawn> {
        let mut slot = self.inner.write().await;
        match slot.as_ref() {
            Some(active) if active.spawn_id == spawn_id => slot.take(),
            _ => None,
        }
    }
}
