//! OKR Storage - Store Trait and In-Memory Implementation
//!
//! Defines the persistence contract for objectives and key results. The two
//! collections are linked only by `KeyResult::objective_id`; the store does
//! not enforce that reference; the engine's cascade manager does.

pub mod compensation;
pub mod filter;
pub mod memory;

pub use compensation::{compensating_cascade_delete, CompensationLog};
pub use filter::{KeyResultFilter, ObjectiveFilter};
pub use memory::InMemoryStore;

use chrono::NaiveDate;
use okr_core::{
    Category, KeyResult, KeyResultId, KeyResultStatus, Objective, ObjectiveId, ObjectiveStatus,
    OkrResult, UserId, ValueUpdate, Visibility,
};
use std::collections::BTreeSet;

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for objectives.
///
/// `updated_by` is mandatory; the store stamps `updated_at` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveUpdate {
    pub updated_by: UserId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: Option<ObjectiveStatus>,
    pub visibility: Option<Visibility>,
    pub tags: Option<BTreeSet<String>>,
    pub aligned_with: Option<BTreeSet<ObjectiveId>>,
    /// Derived value, written only by progress recomputation
    pub progress: Option<u8>,
}

impl ObjectiveUpdate {
    /// Empty update attributed to `updated_by`.
    pub fn by(updated_by: UserId) -> Self {
        Self {
            updated_by,
            title: None,
            description: None,
            category: None,
            status: None,
            visibility: None,
            tags: None,
            aligned_with: None,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_aligned_with(mut self, aligned_with: BTreeSet<ObjectiveId>) -> Self {
        self.aligned_with = Some(aligned_with);
        self
    }
}

/// Update payload for key results.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResultUpdate {
    pub updated_by: UserId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub start_value: Option<f64>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub progress: Option<u8>,
    pub status: Option<KeyResultStatus>,
    pub owner_id: Option<UserId>,
    pub contributor_ids: Option<BTreeSet<UserId>>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<NaiveDate>>,
    /// Appended to the key result's value log
    pub append_update: Option<ValueUpdate>,
}

impl KeyResultUpdate {
    /// Empty update attributed to `updated_by`.
    pub fn by(updated_by: UserId) -> Self {
        Self {
            updated_by,
            title: None,
            description: None,
            unit: None,
            start_value: None,
            target_value: None,
            current_value: None,
            progress: None,
            status: None,
            owner_id: None,
            contributor_ids: None,
            due_date: None,
            append_update: None,
        }
    }
}

/// Records removed by a cascade delete.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeDeletion {
    pub objective: Objective,
    pub key_results: Vec<KeyResult>,
}

impl CascadeDeletion {
    /// Number of documents removed, the objective included.
    pub fn record_count(&self) -> usize {
        self.key_results.len() + 1
    }
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Store trait for OKR entities.
///
/// Point operations are keyed by id; queries are field-equality filters and
/// return records in no particular order.
pub trait OkrStore: Send + Sync {
    // === Objective Operations ===

    /// Insert a new objective. Fails with `InsertFailed` if the id exists.
    fn objective_insert(&self, o: &Objective) -> OkrResult<ObjectiveId>;

    /// Get an objective by ID.
    fn objective_get(&self, id: ObjectiveId) -> OkrResult<Option<Objective>>;

    /// Update an objective, returning the stored result. `NotFound` if absent.
    fn objective_update(&self, id: ObjectiveId, update: ObjectiveUpdate) -> OkrResult<Objective>;

    /// Delete an objective alone. `NotFound` if absent.
    fn objective_delete(&self, id: ObjectiveId) -> OkrResult<()>;

    /// Query objectives matching every set field of the filter.
    fn objective_query(&self, filter: &ObjectiveFilter) -> OkrResult<Vec<Objective>>;

    // === Key Result Operations ===

    /// Insert a new key result. Fails with `InsertFailed` if the id exists.
    fn key_result_insert(&self, kr: &KeyResult) -> OkrResult<KeyResultId>;

    /// Get a key result by ID.
    fn key_result_get(&self, id: KeyResultId) -> OkrResult<Option<KeyResult>>;

    /// Update a key result, returning the stored result. `NotFound` if absent.
    fn key_result_update(&self, id: KeyResultId, update: KeyResultUpdate)
        -> OkrResult<KeyResult>;

    /// Delete a key result. `NotFound` if absent.
    fn key_result_delete(&self, id: KeyResultId) -> OkrResult<()>;

    /// Query key results matching every set field of the filter.
    fn key_result_query(&self, filter: &KeyResultFilter) -> OkrResult<Vec<KeyResult>>;

    // === Batch Operations ===

    /// Delete an objective and all of its key results as one unit.
    ///
    /// Either every record is gone afterwards or none is. The default
    /// implementation runs the deletes one by one and restores removed key
    /// results from a compensation log if a later step fails; stores with
    /// native transactions should override it.
    fn delete_objective_with_dependents(&self, id: ObjectiveId) -> OkrResult<CascadeDeletion> {
        compensating_cascade_delete(self, id)
    }
}
