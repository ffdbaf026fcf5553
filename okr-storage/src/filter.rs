//! Field-equality filters for store queries.
//!
//! An unset field matches every record. Backends that can push a filter
//! down (an indexed column, a document query) translate the set fields;
//! others scan and call `matches`.

use okr_core::{
    CompanyId, KeyResult, KeyResultStatus, Objective, ObjectiveId, ObjectiveStatus, ObjectiveType,
    UserId, WorkspaceId,
};

/// Filter over objectives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectiveFilter {
    pub company_id: Option<CompanyId>,
    pub workspace_id: Option<WorkspaceId>,
    pub user_id: Option<UserId>,
    pub objective_type: Option<ObjectiveType>,
    pub status: Option<ObjectiveStatus>,
    pub parent_objective_id: Option<ObjectiveId>,
}

impl ObjectiveFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn company(mut self, company_id: CompanyId) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn workspace(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn objective_type(mut self, objective_type: ObjectiveType) -> Self {
        self.objective_type = Some(objective_type);
        self
    }

    pub fn status(mut self, status: ObjectiveStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn parent(mut self, parent_objective_id: ObjectiveId) -> Self {
        self.parent_objective_id = Some(parent_objective_id);
        self
    }

    /// Whether the objective satisfies every set field.
    pub fn matches(&self, o: &Objective) -> bool {
        self.company_id.map_or(true, |v| o.company_id == v)
            && self.workspace_id.map_or(true, |v| o.workspace_id == Some(v))
            && self.user_id.map_or(true, |v| o.user_id == Some(v))
            && self.objective_type.map_or(true, |v| o.objective_type == v)
            && self.status.map_or(true, |v| o.status == v)
            && self
                .parent_objective_id
                .map_or(true, |v| o.parent_objective_id == Some(v))
    }
}

/// Filter over key results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyResultFilter {
    pub objective_id: Option<ObjectiveId>,
    pub owner_id: Option<UserId>,
    pub status: Option<KeyResultStatus>,
}

impl KeyResultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All key results of one objective.
    pub fn for_objective(objective_id: ObjectiveId) -> Self {
        Self {
            objective_id: Some(objective_id),
            ..Self::default()
        }
    }

    pub fn owner(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn status(mut self, status: KeyResultStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, kr: &KeyResult) -> bool {
        self.objective_id.map_or(true, |v| kr.objective_id == v)
            && self.owner_id.map_or(true, |v| kr.owner_id == v)
            && self.status.map_or(true, |v| kr.status == v)
    }
}
