//! Store wrapper that fails on demand.
//!
//! Delegates to an [`InMemoryStore`] but keeps the trait's default
//! `delete_objective_with_dependents`, so cascades run through the
//! compensation log and its rollback path can be exercised.

use okr_core::{
    KeyResult, KeyResultId, Objective, ObjectiveId, OkrError, OkrResult, StorageError,
};
use okr_storage::{
    InMemoryStore, KeyResultFilter, KeyResultUpdate, ObjectiveFilter, ObjectiveUpdate, OkrStore,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct FailurePlan {
    /// 1-based numbers of `objective_query` calls that fail
    objective_query_calls: BTreeSet<usize>,
    /// Key-result deletes that succeed before every later one fails
    key_result_deletes_allowed: Option<usize>,
    objective_delete: bool,
    objective_update: bool,
    key_result_insert: bool,
    /// Cascade-delete the parent objective just before a key-result insert
    delete_parent_on_key_result_insert: bool,
}

#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    plan: Mutex<FailurePlan>,
    objective_queries: AtomicUsize,
    key_result_deletes: AtomicUsize,
}

fn injected(operation: &str) -> OkrError {
    OkrError::Storage(StorageError::Unavailable {
        reason: format!("injected {operation} failure"),
    })
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped store, for seeding or inspecting without faults.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn plan(&self) -> OkrResult<MutexGuard<'_, FailurePlan>> {
        self.plan
            .lock()
            .map_err(|_| OkrError::Storage(StorageError::LockPoisoned))
    }

    fn configure(&self, f: impl FnOnce(&mut FailurePlan)) {
        if let Ok(mut plan) = self.plan.lock() {
            f(&mut plan);
        }
    }

    /// Fail the `call`-th `objective_query` (counting from 1).
    pub fn fail_objective_query_call(&self, call: usize) {
        self.configure(|p| {
            p.objective_query_calls.insert(call);
        });
    }

    /// Let `allowed` key-result deletes succeed, then fail the rest.
    pub fn fail_key_result_delete_after(&self, allowed: usize) {
        self.key_result_deletes.store(0, Ordering::SeqCst);
        self.configure(|p| p.key_result_deletes_allowed = Some(allowed));
    }

    pub fn fail_objective_delete(&self) {
        self.configure(|p| p.objective_delete = true);
    }

    pub fn fail_objective_update(&self) {
        self.configure(|p| p.objective_update = true);
    }

    pub fn fail_key_result_insert(&self) {
        self.configure(|p| p.key_result_insert = true);
    }

    /// Delete the parent objective, with its key results, right before
    /// each key-result insert lands.
    pub fn delete_parent_on_key_result_insert(&self) {
        self.configure(|p| p.delete_parent_on_key_result_insert = true);
    }

    /// Clear every injected failure.
    pub fn heal(&self) {
        self.configure(|p| *p = FailurePlan::default());
    }

    /// Number of `objective_query` calls so far.
    pub fn objective_query_calls(&self) -> usize {
        self.objective_queries.load(Ordering::SeqCst)
    }
}

impl OkrStore for FlakyStore {
    fn objective_insert(&self, o: &Objective) -> OkrResult<ObjectiveId> {
        self.inner.objective_insert(o)
    }

    fn objective_get(&self, id: ObjectiveId) -> OkrResult<Option<Objective>> {
        self.inner.objective_get(id)
    }

    fn objective_update(&self, id: ObjectiveId, update: ObjectiveUpdate) -> OkrResult<Objective> {
        if self.plan()?.objective_update {
            return Err(injected("objective update"));
        }
        self.inner.objective_update(id, update)
    }

    fn objective_delete(&self, id: ObjectiveId) -> OkrResult<()> {
        if self.plan()?.objective_delete {
            return Err(injected("objective delete"));
        }
        self.inner.objective_delete(id)
    }

    fn objective_query(&self, filter: &ObjectiveFilter) -> OkrResult<Vec<Objective>> {
        let call = self.objective_queries.fetch_add(1, Ordering::SeqCst) + 1;
        if self.plan()?.objective_query_calls.contains(&call) {
            return Err(injected("objective query"));
        }
        self.inner.objective_query(filter)
    }

    fn key_result_insert(&self, kr: &KeyResult) -> OkrResult<KeyResultId> {
        let (fail, delete_parent) = {
            let plan = self.plan()?;
            (plan.key_result_insert, plan.delete_parent_on_key_result_insert)
        };
        if fail {
            return Err(injected("key result insert"));
        }
        if delete_parent {
            self.inner.delete_objective_with_dependents(kr.objective_id)?;
        }
        self.inner.key_result_insert(kr)
    }

    fn key_result_get(&self, id: KeyResultId) -> OkrResult<Option<KeyResult>> {
        self.inner.key_result_get(id)
    }

    fn key_result_update(&self, id: KeyResultId, update: KeyResultUpdate) -> OkrResult<KeyResult> {
        self.inner.key_result_update(id, update)
    }

    fn key_result_delete(&self, id: KeyResultId) -> OkrResult<()> {
        if let Some(allowed) = self.plan()?.key_result_deletes_allowed {
            if self.key_result_deletes.fetch_add(1, Ordering::SeqCst) >= allowed {
                return Err(injected("key result delete"));
            }
        }
        self.inner.key_result_delete(id)
    }

    fn key_result_query(&self, filter: &KeyResultFilter) -> OkrResult<Vec<KeyResult>> {
        self.inner.key_result_query(filter)
    }
}
