//! Cascade delete for stores without multi-record transactions.
//!
//! Deletes key results one at a time, logging each removed record, then
//! deletes the objective. If any step fails the log is replayed in reverse
//! to re-insert what was removed, so the cascade is all-or-nothing from the
//! caller's point of view.

use crate::{CascadeDeletion, KeyResultFilter, OkrStore};
use okr_core::{
    EntityIdType, EntityType, KeyResult, ObjectiveId, OkrError, OkrResult, StorageError,
};

/// Records removed so far by an in-flight cascade.
#[derive(Debug, Default)]
pub struct CompensationLog {
    removed: Vec<KeyResult>,
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a key result that has been deleted.
    pub fn record(&mut self, kr: KeyResult) {
        self.removed.push(kr);
    }

    pub fn len(&self) -> usize {
        self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    /// Re-insert every logged record, newest first.
    ///
    /// Returns the `TransactionFailed` error to hand back to the caller.
    /// Restore failures are logged and reported in the error reason.
    pub fn rollback<S: OkrStore + ?Sized>(
        self,
        store: &S,
        objective_id: ObjectiveId,
        cause: &OkrError,
    ) -> OkrError {
        let attempted = self.removed.len();
        let mut unrestored = 0usize;

        for kr in self.removed.into_iter().rev() {
            if let Err(e) = store.key_result_insert(&kr) {
                unrestored += 1;
                tracing::error!(
                    objective_id = %objective_id,
                    key_result_id = %kr.id,
                    error = %e,
                    "Failed to restore key result during cascade rollback"
                );
            }
        }

        tracing::warn!(
            objective_id = %objective_id,
            restored = attempted - unrestored,
            unrestored,
            cause = %cause,
            "Cascade delete rolled back"
        );

        let reason = if unrestored == 0 {
            format!("cascade delete of objective {objective_id} rolled back: {cause}")
        } else {
            format!(
                "cascade delete of objective {objective_id} rolled back with {unrestored} unrestored key results: {cause}"
            )
        };
        OkrError::Storage(StorageError::TransactionFailed { reason })
    }
}

/// Delete an objective and its key results using a compensation log.
pub fn compensating_cascade_delete<S: OkrStore + ?Sized>(
    store: &S,
    objective_id: ObjectiveId,
) -> OkrResult<CascadeDeletion> {
    let objective = store
        .objective_get(objective_id)?
        .ok_or_else(|| OkrError::not_found(EntityType::Objective, objective_id.as_uuid()))?;
    let key_results = store.key_result_query(&KeyResultFilter::for_objective(objective_id))?;

    let mut log = CompensationLog::new();
    let mut deleted = Vec::with_capacity(key_results.len());

    for kr in key_results {
        match store.key_result_delete(kr.id) {
            Ok(()) => {
                log.record(kr.clone());
                deleted.push(kr);
            }
            // Removed concurrently; nothing to restore for it.
            Err(e) if e.is_not_found() => {
                tracing::debug!(key_result_id = %kr.id, "Key result already gone during cascade");
            }
            Err(e) => return Err(log.rollback(store, objective_id, &e)),
        }
    }

    if let Err(e) = store.objective_delete(objective_id) {
        return Err(log.rollback(store, objective_id, &e));
    }

    tracing::debug!(
        objective_id = %objective_id,
        key_results = deleted.len(),
        "Cascade delete completed"
    );

    Ok(CascadeDeletion {
        objective,
        key_results: deleted,
    })
}
