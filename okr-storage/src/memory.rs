//! In-memory store.
//!
//! Each collection sits behind its own `RwLock`. The cascade delete takes
//! both write locks (objectives first, then key results) so it is atomic
//! with respect to every other operation on this store.

use crate::{
    CascadeDeletion, KeyResultFilter, KeyResultUpdate, ObjectiveFilter, ObjectiveUpdate, OkrStore,
};
use okr_core::{
    EntityIdType, EntityType, KeyResult, KeyResultId, Objective, ObjectiveId, OkrError, OkrResult,
    StorageError,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory store for tests and single-process deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    objectives: Arc<RwLock<HashMap<ObjectiveId, Objective>>>,
    key_results: Arc<RwLock<HashMap<KeyResultId, KeyResult>>>,
}

fn read<T>(lock: &RwLock<T>) -> OkrResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| OkrError::Storage(StorageError::LockPoisoned))
}

fn write<T>(lock: &RwLock<T>) -> OkrResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| OkrError::Storage(StorageError::LockPoisoned))
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) -> OkrResult<()> {
        write(&self.objectives)?.clear();
        write(&self.key_results)?.clear();
        Ok(())
    }

    /// Get count of stored objectives.
    pub fn objective_count(&self) -> OkrResult<usize> {
        Ok(read(&self.objectives)?.len())
    }

    /// Get count of stored key results.
    pub fn key_result_count(&self) -> OkrResult<usize> {
        Ok(read(&self.key_results)?.len())
    }
}

impl OkrStore for InMemoryStore {
    // === Objective Operations ===

    fn objective_insert(&self, o: &Objective) -> OkrResult<ObjectiveId> {
        let mut objectives = write(&self.objectives)?;
        if objectives.contains_key(&o.id) {
            return Err(OkrError::Storage(StorageError::InsertFailed {
                entity_type: EntityType::Objective,
                reason: format!("Duplicate objective id: {}", o.id),
            }));
        }
        objectives.insert(o.id, o.clone());
        Ok(o.id)
    }

    fn objective_get(&self, id: ObjectiveId) -> OkrResult<Option<Objective>> {
        Ok(read(&self.objectives)?.get(&id).cloned())
    }

    fn objective_update(&self, id: ObjectiveId, update: ObjectiveUpdate) -> OkrResult<Objective> {
        let mut objectives = write(&self.objectives)?;
        let objective = objectives
            .get_mut(&id)
            .ok_or_else(|| OkrError::not_found(EntityType::Objective, id.as_uuid()))?;

        if let Some(title) = update.title {
            objective.title = title;
        }
        if let Some(description) = update.description {
            objective.description = description;
        }
        if let Some(category) = update.category {
            objective.category = category;
        }
        if let Some(status) = update.status {
            objective.status = status;
        }
        if let Some(visibility) = update.visibility {
            objective.visibility = visibility;
        }
        if let Some(tags) = update.tags {
            objective.tags = tags;
        }
        if let Some(aligned_with) = update.aligned_with {
            objective.aligned_with = aligned_with;
        }
        if let Some(progress) = update.progress {
            objective.progress = progress;
        }
        objective.updated_at = chrono::Utc::now();
        objective.updated_by = update.updated_by;

        Ok(objective.clone())
    }

    fn objective_delete(&self, id: ObjectiveId) -> OkrResult<()> {
        write(&self.objectives)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OkrError::not_found(EntityType::Objective, id.as_uuid()))
    }

    fn objective_query(&self, filter: &ObjectiveFilter) -> OkrResult<Vec<Objective>> {
        Ok(read(&self.objectives)?
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect())
    }

    // === Key Result Operations ===

    fn key_result_insert(&self, kr: &KeyResult) -> OkrResult<KeyResultId> {
        let mut key_results = write(&self.key_results)?;
        if key_results.contains_key(&kr.id) {
            return Err(OkrError::Storage(StorageError::InsertFailed {
                entity_type: EntityType::KeyResult,
                reason: format!("Duplicate key result id: {}", kr.id),
            }));
        }
        key_results.insert(kr.id, kr.clone());
        Ok(kr.id)
    }

    fn key_result_get(&self, id: KeyResultId) -> OkrResult<Option<KeyResult>> {
        Ok(read(&self.key_results)?.get(&id).cloned())
    }

    fn key_result_update(
        &self,
        id: KeyResultId,
        update: KeyResultUpdate,
    ) -> OkrResult<KeyResult> {
        let mut key_results = write(&self.key_results)?;
        let kr = key_results
            .get_mut(&id)
            .ok_or_else(|| OkrError::not_found(EntityType::KeyResult, id.as_uuid()))?;

        if let Some(title) = update.title {
            kr.title = title;
        }
        if let Some(description) = update.description {
            kr.description = description;
        }
        if let Some(unit) = update.unit {
            kr.unit = unit;
        }
        if let Some(start_value) = update.start_value {
            kr.start_value = start_value;
        }
        if let Some(target_value) = update.target_value {
            kr.target_value = target_value;
        }
        if let Some(current_value) = update.current_value {
            kr.current_value = current_value;
        }
        if let Some(progress) = update.progress {
            kr.progress = progress;
        }
        if let Some(status) = update.status {
            kr.status = status;
        }
        if let Some(owner_id) = update.owner_id {
            kr.owner_id = owner_id;
        }
        if let Some(contributor_ids) = update.contributor_ids {
            kr.contributor_ids = contributor_ids;
        }
        if let Some(due_date) = update.due_date {
            kr.due_date = due_date;
        }
        if let Some(entry) = update.append_update {
            kr.updates.push(entry);
        }
        kr.updated_at = chrono::Utc::now();
        kr.updated_by = update.updated_by;

        Ok(kr.clone())
    }

    fn key_result_delete(&self, id: KeyResultId) -> OkrResult<()> {
        write(&self.key_results)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OkrError::not_found(EntityType::KeyResult, id.as_uuid()))
    }

    fn key_result_query(&self, filter: &KeyResultFilter) -> OkrResult<Vec<KeyResult>> {
        Ok(read(&self.key_results)?
            .values()
            .filter(|kr| filter.matches(kr))
            .cloned()
            .collect())
    }

    // === Batch Operations ===

    fn delete_objective_with_dependents(&self, id: ObjectiveId) -> OkrResult<CascadeDeletion> {
        let mut objectives = write(&self.objectives)?;
        let mut key_results = write(&self.key_results)?;

        if !objectives.contains_key(&id) {
            return Err(OkrError::not_found(EntityType::Objective, id.as_uuid()));
        }

        let child_ids: Vec<KeyResultId> = key_results
            .values()
            .filter(|kr| kr.objective_id == id)
            .map(|kr| kr.id)
            .collect();
        let removed = child_ids
            .iter()
            .filter_map(|kr_id| key_results.remove(kr_id))
            .collect();
        let objective = objectives
            .remove(&id)
            .ok_or_else(|| OkrError::not_found(EntityType::Objective, id.as_uuid()))?;

        Ok(CascadeDeletion {
            objective,
            key_results: removed,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compensating_cascade_delete;
    use chrono::{NaiveDate, Utc};
    use okr_core::{
        Category, CompanyId, KeyResultStatus, MetricType, ObjectiveStatus, ObjectiveType, Period,
        Quarter, UserId, ValueUpdate, Visibility, WorkspaceId,
    };
    use std::collections::BTreeSet;

    fn make_test_objective(workspace_id: Option<WorkspaceId>) -> Objective {
        let user = UserId::now_v7();
        Objective {
            id: ObjectiveId::now_v7(),
            company_id: CompanyId::now_v7(),
            workspace_id,
            user_id: None,
            parent_objective_id: None,
            objective_type: ObjectiveType::Team,
            level: 1,
            title: "Ship the new onboarding".to_string(),
            description: String::new(),
            category: Category::Product,
            period: Period {
                year: 2025,
                quarter: Some(Quarter::Q1),
                start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            },
            status: ObjectiveStatus::Active,
            progress: 0,
            visibility: Visibility::Workspace,
            aligned_with: BTreeSet::new(),
            tags: BTreeSet::new(),
            created_at: Utc::now(),
            created_by: user,
            updated_at: Utc::now(),
            updated_by: user,
        }
    }

    fn make_test_key_result(objective: &Objective) -> KeyResult {
        KeyResult {
            id: KeyResultId::now_v7(),
            objective_id: objective.id,
            company_id: objective.company_id,
            workspace_id: objective.workspace_id,
            title: "Activation rate".to_string(),
            description: String::new(),
            metric_type: MetricType::Percentage,
            start_value: 20.0,
            target_value: 60.0,
            current_value: 20.0,
            unit: "%".to_string(),
            status: KeyResultStatus::NotStarted,
            progress: 0,
            owner_id: objective.created_by,
            contributor_ids: BTreeSet::new(),
            updates: vec![],
            due_date: None,
            created_at: Utc::now(),
            created_by: objective.created_by,
            updated_at: Utc::now(),
            updated_by: objective.created_by,
        }
    }

    #[test]
    fn test_objective_insert_and_get() {
        let store = InMemoryStore::new();
        let o = make_test_objective(None);
        let id = store.objective_insert(&o).unwrap();
        assert_eq!(id, o.id);
        assert_eq!(store.objective_get(id).unwrap(), Some(o));
    }

    #[test]
    fn test_objective_duplicate_insert_fails() {
        let store = InMemoryStore::new();
        let o = make_test_objective(None);
        store.objective_insert(&o).unwrap();
        let result = store.objective_insert(&o);
        assert!(matches!(
            result,
            Err(OkrError::Storage(StorageError::InsertFailed {
                entity_type: EntityType::Objective,
                ..
            }))
        ));
    }

    #[test]
    fn test_objective_update_stamps_audit_fields() {
        let store = InMemoryStore::new();
        let o = make_test_objective(None);
        store.objective_insert(&o).unwrap();

        let editor = UserId::now_v7();
        let mut update = ObjectiveUpdate::by(editor);
        update.title = Some("Ship onboarding v2".to_string());
        let updated = store.objective_update(o.id, update).unwrap();

        assert_eq!(updated.title, "Ship onboarding v2");
        assert_eq!(updated.updated_by, editor);
        assert!(updated.updated_at >= o.updated_at);
        assert_eq!(updated.created_by, o.created_by);
    }

    #[test]
    fn test_update_and_delete_missing_are_not_found() {
        let store = InMemoryStore::new();
        let missing = ObjectiveId::now_v7();
        let user = UserId::now_v7();

        assert!(store
            .objective_update(missing, ObjectiveUpdate::by(user))
            .unwrap_err()
            .is_not_found());
        assert!(store.objective_delete(missing).unwrap_err().is_not_found());
        assert!(store
            .key_result_update(KeyResultId::now_v7(), KeyResultUpdate::by(user))
            .unwrap_err()
            .is_not_found());
        assert!(store
            .key_result_delete(KeyResultId::now_v7())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_objective_query_by_fields() {
        let store = InMemoryStore::new();
        let workspace = WorkspaceId::now_v7();
        let a = make_test_objective(Some(workspace));
        let b = make_test_objective(Some(WorkspaceId::now_v7()));
        let mut c = make_test_objective(Some(workspace));
        c.status = ObjectiveStatus::Draft;
        for o in [&a, &b, &c] {
            store.objective_insert(o).unwrap();
        }

        let in_workspace = store
            .objective_query(&ObjectiveFilter::new().workspace(workspace))
            .unwrap();
        assert_eq!(in_workspace.len(), 2);

        let active = store
            .objective_query(
                &ObjectiveFilter::new()
                    .workspace(workspace)
                    .status(ObjectiveStatus::Active),
            )
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a.id);
    }

    #[test]
    fn test_key_result_update_appends_log_entry() {
        let store = InMemoryStore::new();
        let o = make_test_objective(None);
        let kr = make_test_key_result(&o);
        store.key_result_insert(&kr).unwrap();

        let user = UserId::now_v7();
        let mut update = KeyResultUpdate::by(user);
        update.current_value = Some(40.0);
        update.append_update = Some(ValueUpdate {
            value: 40.0,
            note: Some("halfway".to_string()),
            updated_by: user,
            updated_at: Utc::now(),
        });
        let updated = store.key_result_update(kr.id, update).unwrap();

        assert_eq!(updated.current_value, 40.0);
        assert_eq!(updated.updates.len(), 1);
        assert_eq!(updated.updates[0].note.as_deref(), Some("halfway"));
    }

    #[test]
    fn test_key_result_due_date_set_then_cleared() {
        let store = InMemoryStore::new();
        let o = make_test_objective(None);
        let kr = make_test_key_result(&o);
        store.key_result_insert(&kr).unwrap();
        let user = UserId::now_v7();
        let due = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();

        let mut set = KeyResultUpdate::by(user);
        set.due_date = Some(Some(due));
        assert_eq!(store.key_result_update(kr.id, set).unwrap().due_date, Some(due));

        // Untouched when the field is absent
        let untouched = store.key_result_update(kr.id, KeyResultUpdate::by(user)).unwrap();
        assert_eq!(untouched.due_date, Some(due));

        let mut clear = KeyResultUpdate::by(user);
        clear.due_date = Some(None);
        assert_eq!(store.key_result_update(kr.id, clear).unwrap().due_date, None);
    }

    #[test]
    fn test_cascade_delete_removes_objective_and_children() {
        let store = InMemoryStore::new();
        let o = make_test_objective(None);
        let other = make_test_objective(None);
        store.objective_insert(&o).unwrap();
        store.objective_insert(&other).unwrap();
        for _ in 0..3 {
            store.key_result_insert(&make_test_key_result(&o)).unwrap();
        }
        let survivor = make_test_key_result(&other);
        store.key_result_insert(&survivor).unwrap();

        let deletion = store.delete_objective_with_dependents(o.id).unwrap();

        assert_eq!(deletion.record_count(), 4);
        assert_eq!(store.objective_count().unwrap(), 1);
        assert_eq!(store.key_result_count().unwrap(), 1);
        assert!(store.key_result_get(survivor.id).unwrap().is_some());
        for kr in &deletion.key_results {
            assert!(store.key_result_get(kr.id).unwrap().is_none());
        }
    }

    #[test]
    fn test_cascade_delete_missing_objective_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .delete_objective_with_dependents(ObjectiveId::now_v7())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_compensating_cascade_matches_locked_cascade() {
        let store = InMemoryStore::new();
        let o = make_test_objective(None);
        store.objective_insert(&o).unwrap();
        store.key_result_insert(&make_test_key_result(&o)).unwrap();
        store.key_result_insert(&make_test_key_result(&o)).unwrap();

        let deletion = compensating_cascade_delete(&store, o.id).unwrap();

        assert_eq!(deletion.record_count(), 3);
        assert_eq!(store.objective_count().unwrap(), 0);
        assert_eq!(store.key_result_count().unwrap(), 0);
    }

    #[test]
    fn test_clear_empties_store() {
        let store = InMemoryStore::new();
        let o = make_test_objective(None);
        store.objective_insert(&o).unwrap();
        store.key_result_insert(&make_test_key_result(&o)).unwrap();
        store.clear().unwrap();
        assert_eq!(store.objective_count().unwrap(), 0);
        assert_eq!(store.key_result_count().unwrap(), 0);
    }
}
