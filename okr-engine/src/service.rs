//! OKR service: the mutation and read API.
//!
//! Every mutating call takes the acting identity explicitly and validates
//! its input before the first write. Key-result mutations go through the
//! cascade manager so the owning objective's progress stays derived.

use crate::aggregation::{AggregationEngine, AggregationReport};
use crate::cascade::{CascadeManager, KeyResultChange};
use crate::locks::RecomputeLocks;
use crate::period::resolve_period;
use crate::progress::{compute_key_result_progress, derive_status, summarize};
use crate::validate::{validate_key_result_values, validate_title};
use chrono::Utc;
use okr_core::{
    EntityIdType, EntityType, IdentityContext, KeyResult, KeyResultId, KeyResultPatch,
    NewKeyResult, NewObjective, Objective, ObjectiveId, ObjectivePatch, ObjectiveQuery,
    ObjectiveStatus, ObjectiveType, Okr, OkrConfig, OkrError, OkrResult, OkrSummary,
    ValidationError, Visibility,
};
use okr_storage::{CascadeDeletion, KeyResultFilter, ObjectiveFilter, ObjectiveUpdate, OkrStore};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct OkrService<S: OkrStore> {
    store: Arc<S>,
    config: Arc<OkrConfig>,
    cascade: CascadeManager<S>,
    aggregation: AggregationEngine<S>,
}

impl<S: OkrStore> OkrService<S> {
    /// Build a service over `store`. Fails if the configuration is invalid.
    pub fn new(store: Arc<S>, config: OkrConfig) -> OkrResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let locks = Arc::new(RecomputeLocks::new(config.serialize_recompute));

        Ok(Self {
            cascade: CascadeManager::new(Arc::clone(&store), Arc::clone(&config), locks),
            aggregation: AggregationEngine::new(Arc::clone(&store), Arc::clone(&config)),
            store,
            config,
        })
    }

    pub fn config(&self) -> &OkrConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn require_objective(&self, id: ObjectiveId) -> OkrResult<Objective> {
        self.store
            .objective_get(id)?
            .ok_or_else(|| OkrError::not_found(EntityType::Objective, id.as_uuid()))
    }

    // ========================================================================
    // OBJECTIVES
    // ========================================================================

    /// Create an objective. Its type and level follow from the request:
    /// public visibility makes a company objective, a user makes an
    /// individual one, otherwise a workspace makes a team one.
    pub fn create_objective(
        &self,
        identity: &IdentityContext,
        request: NewObjective,
    ) -> OkrResult<Objective> {
        let user = identity.require_user()?;
        validate_title("title", &request.title, self.config.max_title_len)?;

        let (objective_type, owner) = match (request.visibility, request.user_id) {
            (Visibility::Public, _) => (ObjectiveType::Company, None),
            (_, Some(owner)) => (ObjectiveType::Individual, Some(owner)),
            (_, None) if request.workspace_id.is_some() => (ObjectiveType::Team, None),
            (_, None) => {
                return Err(OkrError::Validation(ValidationError::RequiredFieldMissing {
                    field: "workspace_id".to_string(),
                }))
            }
        };

        if let Some(parent_id) = request.parent_objective_id {
            self.require_objective(parent_id)?;
        }
        let period = resolve_period(request.period)?;

        let now = Utc::now();
        let objective = Objective {
            id: ObjectiveId::now_v7(),
            company_id: request.company_id,
            workspace_id: request.workspace_id,
            user_id: owner,
            parent_objective_id: request.parent_objective_id,
            objective_type,
            level: objective_type.level(),
            title: request.title,
            description: request.description,
            category: request.category,
            period,
            status: ObjectiveStatus::Active,
            progress: 0,
            visibility: request.visibility,
            aligned_with: BTreeSet::new(),
            tags: request.tags,
            created_at: now,
            created_by: user,
            updated_at: now,
            updated_by: user,
        };

        self.store.objective_insert(&objective)?;
        tracing::info!(
            objective_id = %objective.id,
            objective_type = %objective.objective_type,
            created_by = %user,
            "Objective created"
        );
        Ok(objective)
    }

    pub fn get_objective(&self, id: ObjectiveId) -> OkrResult<Objective> {
        self.require_objective(id)
    }

    /// Edit objective metadata. Type, level, scope and progress are not
    /// editable.
    pub fn update_objective(
        &self,
        identity: &IdentityContext,
        id: ObjectiveId,
        patch: ObjectivePatch,
    ) -> OkrResult<Objective> {
        let user = identity.require_user()?;
        let objective = self.require_objective(id)?;

        if let Some(title) = &patch.title {
            validate_title("title", title, self.config.max_title_len)?;
        }
        if objective.objective_type == ObjectiveType::Company
            && patch.visibility.is_some_and(|v| v != Visibility::Public)
        {
            return Err(OkrError::Validation(ValidationError::ConstraintViolation {
                constraint: "visibility".to_string(),
                reason: "Company goals must stay public".to_string(),
            }));
        }

        let update = ObjectiveUpdate {
            title: patch.title,
            description: patch.description,
            category: patch.category,
            status: patch.status,
            visibility: patch.visibility,
            tags: patch.tags,
            ..ObjectiveUpdate::by(user)
        };
        self.store.objective_update(id, update)
    }

    /// Delete an objective together with all of its key results.
    pub fn delete_objective(
        &self,
        identity: &IdentityContext,
        id: ObjectiveId,
    ) -> OkrResult<CascadeDeletion> {
        self.cascade.delete_objective(identity, id)
    }

    /// Direct children of an objective in the hierarchy.
    pub fn list_child_objectives(&self, parent_id: ObjectiveId) -> OkrResult<Vec<Objective>> {
        self.require_objective(parent_id)?;
        let mut children = self
            .store
            .objective_query(&ObjectiveFilter::new().parent(parent_id))?;
        children.sort_by_key(|o| (o.created_at, o.id));
        Ok(children)
    }

    /// Mark two objectives as aligned with each other.
    pub fn align_objectives(
        &self,
        identity: &IdentityContext,
        a: ObjectiveId,
        b: ObjectiveId,
    ) -> OkrResult<(Objective, Objective)> {
        self.set_alignment(identity, a, b, true)
    }

    /// Remove the alignment between two objectives.
    pub fn unalign_objectives(
        &self,
        identity: &IdentityContext,
        a: ObjectiveId,
        b: ObjectiveId,
    ) -> OkrResult<(Objective, Objective)> {
        self.set_alignment(identity, a, b, false)
    }

    fn set_alignment(
        &self,
        identity: &IdentityContext,
        a: ObjectiveId,
        b: ObjectiveId,
        aligned: bool,
    ) -> OkrResult<(Objective, Objective)> {
        let user = identity.require_user()?;
        if a == b {
            return Err(OkrError::invalid(
                "aligned_with",
                "a goal cannot be aligned with itself",
            ));
        }
        let first = self.require_objective(a)?;
        let second = self.require_objective(b)?;

        let toggle = |set: &BTreeSet<ObjectiveId>, other: ObjectiveId| {
            let mut set = set.clone();
            if aligned {
                set.insert(other);
            } else {
                set.remove(&other);
            }
            set
        };

        let first_updated = self.store.objective_update(
            a,
            ObjectiveUpdate::by(user).with_aligned_with(toggle(&first.aligned_with, b)),
        )?;
        let second_updated = match self.store.objective_update(
            b,
            ObjectiveUpdate::by(user).with_aligned_with(toggle(&second.aligned_with, a)),
        ) {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!(objective_id = %a, error = %e, "Alignment failed, restoring");
                if let Err(restore) = self.store.objective_update(
                    a,
                    ObjectiveUpdate::by(user).with_aligned_with(first.aligned_with),
                ) {
                    tracing::error!(objective_id = %a, error = %restore, "Alignment restore failed");
                }
                return Err(e);
            }
        };

        tracing::debug!(a = %a, b = %b, aligned, "Alignment updated");
        Ok((first_updated, second_updated))
    }

    /// An objective with its key results, oldest first.
    pub fn get_okr(&self, id: ObjectiveId) -> OkrResult<Okr> {
        let objective = self.require_objective(id)?;
        let key_results = self.sorted_key_results(id)?;
        Ok(Okr {
            objective,
            key_results,
        })
    }

    // ========================================================================
    // KEY RESULTS
    // ========================================================================

    /// Add a key result to an existing objective and refresh the objective's
    /// progress. Nothing is left behind if the objective is missing, even
    /// when it disappears mid-call.
    pub fn create_key_result(
        &self,
        identity: &IdentityContext,
        objective_id: ObjectiveId,
        request: NewKeyResult,
    ) -> OkrResult<KeyResult> {
        let user = identity.require_user()?;
        validate_title("title", &request.title, self.config.max_title_len)?;
        validate_key_result_values(
            request.metric_type,
            request.start_value,
            request.target_value,
            request.start_value,
        )?;
        let objective = self.require_objective(objective_id)?;

        let progress = compute_key_result_progress(
            request.start_value,
            request.start_value,
            request.target_value,
        );
        let now = Utc::now();
        let kr = KeyResult {
            id: KeyResultId::now_v7(),
            objective_id,
            company_id: objective.company_id,
            workspace_id: objective.workspace_id,
            title: request.title,
            description: request.description,
            metric_type: request.metric_type,
            start_value: request.start_value,
            target_value: request.target_value,
            current_value: request.start_value,
            unit: request.unit,
            status: derive_status(progress),
            progress,
            owner_id: request.owner_id.unwrap_or(user),
            contributor_ids: request.contributor_ids,
            updates: Vec::new(),
            due_date: request.due_date,
            created_at: now,
            created_by: user,
            updated_at: now,
            updated_by: user,
        };

        self.store.key_result_insert(&kr)?;

        match self.cascade.recompute_objective(user, objective_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                // Objective deleted between the check and the insert
                self.store.key_result_delete(kr.id)?;
                tracing::debug!(
                    key_result_id = %kr.id,
                    objective_id = %objective_id,
                    "Objective vanished, key result withdrawn"
                );
                return Err(OkrError::not_found(EntityType::Objective, objective_id.as_uuid()));
            }
            Err(e) => {
                tracing::warn!(
                    objective_id = %objective_id,
                    error = %e,
                    "Objective recompute failed, progress is stale"
                );
            }
        }

        tracing::info!(key_result_id = %kr.id, objective_id = %objective_id, "Key result created");
        Ok(kr)
    }

    pub fn get_key_result(&self, id: KeyResultId) -> OkrResult<KeyResult> {
        self.store
            .key_result_get(id)?
            .ok_or_else(|| OkrError::not_found(EntityType::KeyResult, id.as_uuid()))
    }

    /// Key results of an objective, oldest first.
    pub fn list_key_results(&self, objective_id: ObjectiveId) -> OkrResult<Vec<KeyResult>> {
        self.require_objective(objective_id)?;
        self.sorted_key_results(objective_id)
    }

    fn sorted_key_results(&self, objective_id: ObjectiveId) -> OkrResult<Vec<KeyResult>> {
        let mut krs = self
            .store
            .key_result_query(&KeyResultFilter::for_objective(objective_id))?;
        krs.sort_by_key(|kr| (kr.created_at, kr.id));
        Ok(krs)
    }

    /// Record a new current value, optionally with a note.
    pub fn update_key_result_value(
        &self,
        identity: &IdentityContext,
        id: KeyResultId,
        value: f64,
        note: Option<String>,
    ) -> OkrResult<KeyResult> {
        self.cascade
            .update_key_result(identity, id, KeyResultChange::Value { value, note })
    }

    /// Edit key-result metadata or bounds.
    pub fn update_key_result(
        &self,
        identity: &IdentityContext,
        id: KeyResultId,
        patch: KeyResultPatch,
    ) -> OkrResult<KeyResult> {
        self.cascade
            .update_key_result(identity, id, KeyResultChange::Metadata(patch))
    }

    pub fn delete_key_result(
        &self,
        identity: &IdentityContext,
        id: KeyResultId,
    ) -> OkrResult<KeyResult> {
        self.cascade.delete_key_result(identity, id)
    }

    // ========================================================================
    // LISTINGS
    // ========================================================================

    pub fn list_objectives(&self, query: &ObjectiveQuery) -> OkrResult<Vec<Objective>> {
        self.aggregation.list_objectives(query)
    }

    pub fn list_objectives_detailed(&self, query: &ObjectiveQuery) -> OkrResult<AggregationReport> {
        self.aggregation.list_objectives_detailed(query)
    }

    /// Status counts and mean progress of a listing.
    pub fn summarize(&self, query: &ObjectiveQuery) -> OkrResult<OkrSummary> {
        let objectives = self.aggregation.list_objectives(query)?;
        Ok(summarize(&objectives))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use okr_core::{Category, CompanyId, MetricType, PeriodSpec, Quarter, UserId, WorkspaceId};
    use okr_storage::InMemoryStore;

    fn service() -> OkrService<InMemoryStore> {
        OkrService::new(Arc::new(InMemoryStore::new()), OkrConfig::default()).unwrap()
    }

    fn q2() -> PeriodSpec {
        PeriodSpec::Quarter {
            year: 2025,
            quarter: Quarter::Q2,
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = OkrConfig {
            supported_years: vec![],
            ..OkrConfig::default()
        };
        assert!(OkrService::new(Arc::new(InMemoryStore::new()), config).is_err());
    }

    #[test]
    fn test_type_derivation() {
        let svc = service();
        let me = IdentityContext::user(UserId::now_v7());
        let company = CompanyId::now_v7();
        let workspace = WorkspaceId::now_v7();
        let owner = UserId::now_v7();

        let public = svc
            .create_objective(
                &me,
                NewObjective::new(company, "Win the market", Category::Growth, q2())
                    .with_user(owner)
                    .with_visibility(Visibility::Public),
            )
            .unwrap();
        assert_eq!(public.objective_type, ObjectiveType::Company);
        assert_eq!(public.level, 0);
        assert_eq!(public.user_id, None);

        let individual = svc
            .create_objective(
                &me,
                NewObjective::new(company, "Ship my feature", Category::Product, q2())
                    .with_user(owner)
                    .with_workspace(workspace),
            )
            .unwrap();
        assert_eq!(individual.objective_type, ObjectiveType::Individual);
        assert_eq!(individual.level, 2);

        let team = svc
            .create_objective(
                &me,
                NewObjective::new(company, "Cut churn", Category::Customer, q2())
                    .with_workspace(workspace),
            )
            .unwrap();
        assert_eq!(team.objective_type, ObjectiveType::Team);
        assert_eq!(team.level, 1);
        assert!(team.is_ownership_coherent());
    }

    #[test]
    fn test_unscoped_private_objective_rejected() {
        let svc = service();
        let me = IdentityContext::user(UserId::now_v7());
        let err = svc
            .create_objective(
                &me,
                NewObjective::new(CompanyId::now_v7(), "Nowhere", Category::People, q2()),
            )
            .unwrap_err();
        assert_eq!(err.user_message(), "workspace_id is required");
    }

    #[test]
    fn test_company_objective_stays_public() {
        let svc = service();
        let me = IdentityContext::user(UserId::now_v7());
        let objective = svc
            .create_objective(
                &me,
                NewObjective::new(CompanyId::now_v7(), "Grow", Category::Revenue, q2())
                    .with_visibility(Visibility::Public),
            )
            .unwrap();

        let patch = ObjectivePatch {
            visibility: Some(Visibility::Private),
            ..ObjectivePatch::default()
        };
        assert!(svc.update_objective(&me, objective.id, patch).is_err());

        let rename = ObjectivePatch {
            title: Some("Grow faster".to_string()),
            ..ObjectivePatch::default()
        };
        let updated = svc.update_objective(&me, objective.id, rename).unwrap();
        assert_eq!(updated.title, "Grow faster");
        assert_eq!(updated.objective_type, ObjectiveType::Company);
    }

    #[test]
    fn test_anonymous_caller_rejected() {
        let svc = service();
        let err = svc
            .create_objective(
                &IdentityContext::anonymous(),
                NewObjective::new(CompanyId::now_v7(), "Grow", Category::Growth, q2())
                    .with_visibility(Visibility::Public),
            )
            .unwrap_err();
        assert_eq!(err.user_message(), "Please sign in again");
    }

    #[test]
    fn test_key_result_rejected_before_write() {
        let svc = service();
        let me = IdentityContext::user(UserId::now_v7());
        let objective = svc
            .create_objective(
                &me,
                NewObjective::new(CompanyId::now_v7(), "Quality", Category::Product, q2())
                    .with_visibility(Visibility::Public),
            )
            .unwrap();

        let bad = NewKeyResult::new("Coverage", MetricType::Percentage, 0.0, 120.0);
        assert!(svc.create_key_result(&me, objective.id, bad).is_err());
        assert_eq!(svc.store().key_result_count().unwrap(), 0);
    }

    #[test]
    fn test_value_update_appends_log_but_metadata_does_not() {
        let svc = service();
        let me = IdentityContext::user(UserId::now_v7());
        let objective = svc
            .create_objective(
                &me,
                NewObjective::new(CompanyId::now_v7(), "Revenue", Category::Revenue, q2())
                    .with_visibility(Visibility::Public),
            )
            .unwrap();
        let kr = svc
            .create_key_result(
                &me,
                objective.id,
                NewKeyResult::new("ARR", MetricType::Currency, 0.0, 1000.0).with_unit("USD"),
            )
            .unwrap();

        let kr = svc
            .update_key_result_value(&me, kr.id, 750.0, Some("Big deal closed".to_string()))
            .unwrap();
        assert_eq!(kr.progress, 75);
        assert_eq!(kr.updates.len(), 1);
        assert_eq!(kr.updates[0].note.as_deref(), Some("Big deal closed"));

        let patch = KeyResultPatch {
            target_value: Some(1500.0),
            ..KeyResultPatch::default()
        };
        let kr = svc.update_key_result(&me, kr.id, patch).unwrap();
        assert_eq!(kr.progress, 50);
        assert_eq!(kr.status, okr_core::KeyResultStatus::AtRisk);
        assert_eq!(kr.updates.len(), 1);

        assert_eq!(svc.get_objective(objective.id).unwrap().progress, 50);
    }

    #[test]
    fn test_alignment_is_symmetric() {
        let svc = service();
        let me = IdentityContext::user(UserId::now_v7());
        let company = CompanyId::now_v7();
        let make = |title: &str| {
            svc.create_objective(
                &me,
                NewObjective::new(company, title, Category::Operations, q2())
                    .with_visibility(Visibility::Public),
            )
            .unwrap()
        };
        let (a, b) = (make("A"), make("B"));

        let (a2, b2) = svc.align_objectives(&me, a.id, b.id).unwrap();
        assert!(a2.aligned_with.contains(&b.id));
        assert!(b2.aligned_with.contains(&a.id));

        let (a3, b3) = svc.unalign_objectives(&me, a.id, b.id).unwrap();
        assert!(a3.aligned_with.is_empty());
        assert!(b3.aligned_with.is_empty());

        assert!(svc.align_objectives(&me, a.id, a.id).is_err());
        assert!(svc
            .align_objectives(&me, a.id, ObjectiveId::now_v7())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_children_require_existing_parent() {
        let svc = service();
        let me = IdentityContext::user(UserId::now_v7());
        let company = CompanyId::now_v7();
        let missing = ObjectiveId::now_v7();

        let err = svc
            .create_objective(
                &me,
                NewObjective::new(company, "Orphan", Category::Growth, q2())
                    .with_visibility(Visibility::Public)
                    .with_parent(missing),
            )
            .unwrap_err();
        assert!(err.is_not_found());

        let parent = svc
            .create_objective(
                &me,
                NewObjective::new(company, "Parent", Category::Growth, q2())
                    .with_visibility(Visibility::Public),
            )
            .unwrap();
        let child = svc
            .create_objective(
                &me,
                NewObjective::new(company, "Child", Category::Growth, q2())
                    .with_workspace(WorkspaceId::now_v7())
                    .with_parent(parent.id),
            )
            .unwrap();

        let children = svc.list_child_objectives(parent.id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);
        assert!(svc.list_child_objectives(missing).is_err());
    }
}
