//! Cascade manager.
//!
//! Keeps an objective and its key results consistent under structural
//! changes: atomic objective deletes, existence-guarded key-result edits,
//! and the objective progress recompute that follows every key-result
//! mutation.

use crate::locks::RecomputeLocks;
use crate::progress::{compute_key_result_progress, compute_objective_progress, derive_status};
use crate::validate::{validate_key_result_values, validate_title};
use chrono::Utc;
use okr_core::{
    EntityIdType, EntityType, IdentityContext, KeyResult, KeyResultId, KeyResultPatch, Objective,
    ObjectiveId, OkrConfig, OkrError, OkrResult, UserId, ValueUpdate,
};
use okr_storage::{CascadeDeletion, KeyResultFilter, KeyResultUpdate, ObjectiveUpdate, OkrStore};
use std::sync::Arc;

/// A change to an existing key result.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyResultChange {
    /// Record a new current value; appended to the value log
    Value { value: f64, note: Option<String> },
    /// Edit metadata or bounds; never appended to the value log
    Metadata(KeyResultPatch),
}

/// Coordinates multi-record consistency for objectives and key results.
pub struct CascadeManager<S: OkrStore> {
    store: Arc<S>,
    config: Arc<OkrConfig>,
    locks: Arc<RecomputeLocks>,
}

impl<S: OkrStore> CascadeManager<S> {
    pub fn new(store: Arc<S>, config: Arc<OkrConfig>, locks: Arc<RecomputeLocks>) -> Self {
        Self {
            store,
            config,
            locks,
        }
    }

    fn require_key_result(&self, id: KeyResultId) -> OkrResult<KeyResult> {
        self.store
            .key_result_get(id)?
            .ok_or_else(|| OkrError::not_found(EntityType::KeyResult, id.as_uuid()))
    }

    /// Delete an objective and every key result under it, atomically.
    pub fn delete_objective(
        &self,
        identity: &IdentityContext,
        id: ObjectiveId,
    ) -> OkrResult<CascadeDeletion> {
        let user = identity.require_user()?;
        if self.store.objective_get(id)?.is_none() {
            return Err(OkrError::not_found(EntityType::Objective, id.as_uuid()));
        }

        let deletion = self.store.delete_objective_with_dependents(id)?;
        self.locks.forget(id);

        tracing::info!(
            objective_id = %id,
            deleted_by = %user,
            key_results = deletion.key_results.len(),
            "Objective deleted with dependents"
        );
        Ok(deletion)
    }

    /// Delete one key result, then recompute its objective if that still
    /// exists. Returns the removed record.
    pub fn delete_key_result(
        &self,
        identity: &IdentityContext,
        id: KeyResultId,
    ) -> OkrResult<KeyResult> {
        let user = identity.require_user()?;
        let kr = self.require_key_result(id)?;

        self.store.key_result_delete(id)?;
        tracing::debug!(key_result_id = %id, objective_id = %kr.objective_id, "Key result deleted");

        self.recompute_after_write(user, kr.objective_id);
        Ok(kr)
    }

    /// Apply a change to a key result, re-deriving its progress and status,
    /// then recompute its objective.
    pub fn update_key_result(
        &self,
        identity: &IdentityContext,
        id: KeyResultId,
        change: KeyResultChange,
    ) -> OkrResult<KeyResult> {
        let user = identity.require_user()?;
        let kr = self.require_key_result(id)?;
        let update = self.plan_update(user, &kr, change)?;

        let updated = self.store.key_result_update(id, update)?;
        tracing::debug!(
            key_result_id = %id,
            progress = updated.progress,
            status = %updated.status,
            "Key result updated"
        );

        self.recompute_after_write(user, updated.objective_id);
        Ok(updated)
    }

    /// Validate a change against the stored record and turn it into a store
    /// update. Nothing is written here.
    fn plan_update(
        &self,
        user: UserId,
        kr: &KeyResult,
        change: KeyResultChange,
    ) -> OkrResult<KeyResultUpdate> {
        let mut update = KeyResultUpdate::by(user);

        match change {
            KeyResultChange::Value { value, note } => {
                validate_key_result_values(kr.metric_type, kr.start_value, kr.target_value, value)?;
                let progress = compute_key_result_progress(kr.start_value, value, kr.target_value);
                update.current_value = Some(value);
                update.progress = Some(progress);
                update.status = Some(derive_status(progress));
                update.append_update = Some(ValueUpdate {
                    value,
                    note: note.filter(|n| !n.trim().is_empty()),
                    updated_by: user,
                    updated_at: Utc::now(),
                });
            }
            KeyResultChange::Metadata(patch) => {
                if let Some(title) = &patch.title {
                    validate_title("title", title, self.config.max_title_len)?;
                }

                let bounds_changed = patch.start_value.is_some() || patch.target_value.is_some();
                if bounds_changed {
                    let start = patch.start_value.unwrap_or(kr.start_value);
                    let target = patch.target_value.unwrap_or(kr.target_value);
                    validate_key_result_values(kr.metric_type, start, target, kr.current_value)?;
                    let progress = compute_key_result_progress(start, kr.current_value, target);
                    update.start_value = patch.start_value;
                    update.target_value = patch.target_value;
                    update.progress = Some(progress);
                    update.status = Some(derive_status(progress));
                }

                update.title = patch.title;
                update.description = patch.description;
                update.unit = patch.unit;
                update.owner_id = patch.owner_id;
                update.contributor_ids = patch.contributor_ids;
                update.due_date = patch.due_date;
            }
        }

        Ok(update)
    }

    /// Recompute following a key-result write that is already committed.
    ///
    /// A failure is logged, not returned: the caller's write stands and a
    /// retry would duplicate it. The next mutation of any key result under
    /// the objective brings its progress back in line.
    pub fn recompute_after_write(&self, updated_by: UserId, objective_id: ObjectiveId) {
        if let Err(e) = self.recompute_objective(updated_by, objective_id) {
            tracing::warn!(
                objective_id = %objective_id,
                error = %e,
                "Objective recompute failed, progress is stale"
            );
        }
    }

    /// Re-derive an objective's progress from its key results and persist it.
    ///
    /// Returns `None` without error when the objective no longer exists, so
    /// that removing orphaned children never fails on the recompute step.
    pub fn recompute_objective(
        &self,
        updated_by: UserId,
        objective_id: ObjectiveId,
    ) -> OkrResult<Option<Objective>> {
        let outcome = self.locks.with_lock(objective_id, || {
            let Some(objective) = self.store.objective_get(objective_id)? else {
                tracing::debug!(objective_id = %objective_id, "Objective gone, skipping recompute");
                return Ok(None);
            };

            let progress: Vec<u8> = self
                .store
                .key_result_query(&KeyResultFilter::for_objective(objective_id))?
                .iter()
                .map(|kr| kr.progress)
                .collect();
            let recomputed = compute_objective_progress(&progress);

            if recomputed == objective.progress {
                return Ok(Some(objective));
            }

            match self.store.objective_update(
                objective_id,
                ObjectiveUpdate::by(updated_by).with_progress(recomputed),
            ) {
                Ok(updated) => {
                    tracing::debug!(
                        objective_id = %objective_id,
                        from = objective.progress,
                        to = recomputed,
                        key_results = progress.len(),
                        "Objective progress recomputed"
                    );
                    Ok(Some(updated))
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(objective_id = %objective_id, "Objective deleted during recompute");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })?;

        if outcome.is_none() {
            self.locks.forget(objective_id);
        }
        Ok(outcome)
    }
}
