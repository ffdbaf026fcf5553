//! Request payloads accepted by the engine's public operations

use crate::{
    Category, CompanyId, MetricType, ObjectiveId, ObjectiveStatus, PeriodView, Quarter, ScopeView,
    UserId, Visibility, WorkspaceId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the period of a new objective is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodSpec {
    /// Bounds of a calendar quarter
    Quarter { year: i32, quarter: Quarter },
    /// January 1 through December 31
    Year { year: i32 },
    /// Explicit inclusive range; the year is taken from `start_date`
    Custom {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

/// Fields for creating an objective.
///
/// `type` and `level` are not part of the request; they are derived from
/// `visibility`, `user_id` and `workspace_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObjective {
    pub company_id: CompanyId,
    pub workspace_id: Option<WorkspaceId>,
    pub user_id: Option<UserId>,
    pub parent_objective_id: Option<ObjectiveId>,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub visibility: Visibility,
    pub period: PeriodSpec,
    pub tags: BTreeSet<String>,
}

impl NewObjective {
    /// Start a request with required fields; visibility defaults to workspace.
    pub fn new(
        company_id: CompanyId,
        title: impl Into<String>,
        category: Category,
        period: PeriodSpec,
    ) -> Self {
        Self {
            company_id,
            workspace_id: None,
            user_id: None,
            parent_objective_id: None,
            title: title.into(),
            description: String::new(),
            category,
            visibility: Visibility::Workspace,
            period,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_workspace(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_parent(mut self, parent_objective_id: ObjectiveId) -> Self {
        self.parent_objective_id = Some(parent_objective_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Metadata edit of an objective. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectivePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: Option<ObjectiveStatus>,
    pub visibility: Option<Visibility>,
    pub tags: Option<BTreeSet<String>>,
}

/// Fields for creating a key result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewKeyResult {
    pub title: String,
    pub description: String,
    pub metric_type: MetricType,
    pub start_value: f64,
    pub target_value: f64,
    pub unit: String,
    /// Defaults to the acting user
    pub owner_id: Option<UserId>,
    pub contributor_ids: BTreeSet<UserId>,
    pub due_date: Option<NaiveDate>,
}

impl NewKeyResult {
    pub fn new(
        title: impl Into<String>,
        metric_type: MetricType,
        start_value: f64,
        target_value: f64,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            metric_type,
            start_value,
            target_value,
            unit: String::new(),
            owner_id: None,
            contributor_ids: BTreeSet::new(),
            due_date: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_owner(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_contributors(mut self, contributors: impl IntoIterator<Item = UserId>) -> Self {
        self.contributor_ids = contributors.into_iter().collect();
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Metadata edit of a key result.
///
/// Changing the bounds recomputes progress but does not append to the value
/// log; only explicit value updates do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyResultPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub start_value: Option<f64>,
    pub target_value: Option<f64>,
    pub owner_id: Option<UserId>,
    pub contributor_ids: Option<BTreeSet<UserId>>,
    /// `Some(None)` clears the due date; JSON `null` maps to that
    #[serde(default, deserialize_with = "present_or_null")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl KeyResultPatch {
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(Some(due_date));
        self
    }

    pub fn clear_due_date(mut self) -> Self {
        self.due_date = Some(None);
        self
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Parameters of an objective listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectiveQuery {
    /// Restricts every scope to one company when set
    pub company_id: Option<CompanyId>,
    pub workspace_id: Option<WorkspaceId>,
    pub user_id: Option<UserId>,
    pub view: ScopeView,
    pub period: PeriodView,
    /// Defaults to the current quarter for `PeriodView::Quarter`
    pub quarter: Option<u8>,
    /// Defaults to the current year for `Quarter` and `Year` listings
    pub year: Option<i32>,
}

impl ObjectiveQuery {
    pub fn new(view: ScopeView, period: PeriodView) -> Self {
        Self {
            view,
            period,
            ..Self::default()
        }
    }

    pub fn for_company(mut self, company_id: CompanyId) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn in_workspace(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn at_quarter(mut self, year: i32, quarter: u8) -> Self {
        self.year = Some(year);
        self.quarter = Some(quarter);
        self
    }

    pub fn at_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_due_date_absent_null_and_set() {
        let absent: KeyResultPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.due_date, None);

        let cleared: KeyResultPatch = serde_json::from_str(r#"{"due_date": null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));

        let set: KeyResultPatch = serde_json::from_str(r#"{"due_date": "2025-06-30"}"#).unwrap();
        assert_eq!(set.due_date, Some(NaiveDate::from_ymd_opt(2025, 6, 30)));
    }

    #[test]
    fn test_patch_due_date_builders() {
        let due = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(KeyResultPatch::default().with_due_date(due).due_date, Some(Some(due)));
        assert_eq!(KeyResultPatch::default().clear_due_date().due_date, Some(None));
    }
}
