//! Core entity structures

use crate::{
    Category, CompanyId, KeyResultId, KeyResultStatus, MetricType, ObjectiveId, ObjectiveStatus,
    ObjectiveType, Quarter, Timestamp, UserId, Visibility, WorkspaceId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Time window an objective is scoped to.
///
/// Either the bounds of a quarter (or whole year) or a custom range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Period {
    pub year: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<u8>))]
    pub quarter: Option<Quarter>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Objective - a qualitative goal at company, team, or individual scope.
///
/// `progress` is never authored directly; it is recomputed from the
/// objective's key results on every key-result mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Objective {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: ObjectiveId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub company_id: CompanyId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub workspace_id: Option<WorkspaceId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub user_id: Option<UserId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub parent_objective_id: Option<ObjectiveId>,
    #[serde(rename = "type")]
    pub objective_type: ObjectiveType,
    pub level: u8,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub period: Period,
    pub status: ObjectiveStatus,
    pub progress: u8,
    pub visibility: Visibility,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub aligned_with: BTreeSet<ObjectiveId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub tags: BTreeSet<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub created_by: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub updated_by: UserId,
}

impl Objective {
    /// Whether the stored ownership fields agree with the objective type.
    ///
    /// Company objectives are public and unowned by a user, team objectives
    /// carry a workspace, individual objectives carry a user.
    pub fn is_ownership_coherent(&self) -> bool {
        match self.objective_type {
            ObjectiveType::Company => {
                self.visibility == Visibility::Public && self.user_id.is_none()
            }
            ObjectiveType::Team => self.workspace_id.is_some(),
            ObjectiveType::Individual => self.user_id.is_some(),
        }
    }
}

/// One entry of a key result's append-only value log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValueUpdate {
    pub value: f64,
    pub note: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub updated_by: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// KeyResult - a quantitative measure tracking progress toward an objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KeyResult {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: KeyResultId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub objective_id: ObjectiveId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub company_id: CompanyId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub workspace_id: Option<WorkspaceId>,
    pub title: String,
    pub description: String,
    pub metric_type: MetricType,
    pub start_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    pub status: KeyResultStatus,
    pub progress: u8,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub owner_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub contributor_ids: BTreeSet<UserId>,
    pub updates: Vec<ValueUpdate>,
    pub due_date: Option<NaiveDate>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub created_by: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub updated_by: UserId,
}

/// An objective together with its key results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Okr {
    pub objective: Objective,
    pub key_results: Vec<KeyResult>,
}

/// Dashboard roll-up over a set of objectives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OkrSummary {
    pub total: usize,
    pub draft: usize,
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Rounded mean progress; 0 for an empty set
    pub average_progress: u8,
}
