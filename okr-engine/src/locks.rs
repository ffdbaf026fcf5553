//! Per-objective serialization of progress recomputes.
//!
//! Recomputing an objective is read-all-key-results, average, write back.
//! Two concurrent recomputes of the same objective can interleave and the
//! slower write wins with a stale average. Holding a per-objective mutex
//! across the read and the write closes that gap within one process.

use okr_core::{ObjectiveId, OkrError, OkrResult, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Keyed mutexes, one per objective that has been recomputed.
#[derive(Debug)]
pub struct RecomputeLocks {
    enabled: bool,
    slots: Mutex<HashMap<ObjectiveId, Arc<Mutex<()>>>>,
}

impl RecomputeLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `f` while holding the objective's lock.
    pub fn with_lock<T>(
        &self,
        objective_id: ObjectiveId,
        f: impl FnOnce() -> OkrResult<T>,
    ) -> OkrResult<T> {
        if !self.enabled {
            return f();
        }

        let slot = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| OkrError::Storage(StorageError::LockPoisoned))?;
            Arc::clone(slots.entry(objective_id).or_default())
        };
        let _held = slot
            .lock()
            .map_err(|_| OkrError::Storage(StorageError::LockPoisoned))?;
        f()
    }

    /// Drop the slot of an objective that no longer exists.
    pub fn forget(&self, objective_id: ObjectiveId) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(&objective_id);
        }
    }

    /// Number of objectives with an allocated slot.
    pub fn slot_count(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }
}
