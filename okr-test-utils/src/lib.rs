//! OKR Test Utilities
//!
//! Shared test infrastructure for the OKR workspace:
//! - Proptest generators for ids, enums, periods and entities
//! - Fixtures for common objectives and key results
//! - `FlakyStore`, an in-memory store with injectable failures
//! - Custom assertions for OKR error kinds

pub use okr_storage::{InMemoryStore, KeyResultFilter, ObjectiveFilter, OkrStore};

pub use okr_core::{
    AuthError, Category, CompanyId, EntityIdType, EntityType, IdentityContext, KeyResult,
    KeyResultId, KeyResultStatus, MetricType, Objective, ObjectiveId, ObjectiveStatus,
    ObjectiveType, OkrConfig, OkrError, OkrResult, Period, Quarter, StorageError, Timestamp,
    UserId, ValidationError, Visibility, WorkspaceId,
};

use chrono::{NaiveDate, Utc};
use std::collections::BTreeSet;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating OKR entity types.

    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    // === Identity Type Generators ===

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_objective_id() -> impl Strategy<Value = ObjectiveId> {
        arb_uuid().prop_map(ObjectiveId::new)
    }

    pub fn arb_key_result_id() -> impl Strategy<Value = KeyResultId> {
        arb_uuid().prop_map(KeyResultId::new)
    }

    pub fn arb_company_id() -> impl Strategy<Value = CompanyId> {
        arb_uuid().prop_map(CompanyId::new)
    }

    pub fn arb_workspace_id() -> impl Strategy<Value = WorkspaceId> {
        arb_uuid().prop_map(WorkspaceId::new)
    }

    pub fn arb_user_id() -> impl Strategy<Value = UserId> {
        arb_uuid().prop_map(UserId::new)
    }

    // === Enum Generators ===

    pub fn arb_quarter() -> impl Strategy<Value = Quarter> {
        prop_oneof![
            Just(Quarter::Q1),
            Just(Quarter::Q2),
            Just(Quarter::Q3),
            Just(Quarter::Q4),
        ]
    }

    pub fn arb_objective_type() -> impl Strategy<Value = ObjectiveType> {
        prop_oneof![
            Just(ObjectiveType::Company),
            Just(ObjectiveType::Team),
            Just(ObjectiveType::Individual),
        ]
    }

    pub fn arb_objective_status() -> impl Strategy<Value = ObjectiveStatus> {
        prop_oneof![
            Just(ObjectiveStatus::Draft),
            Just(ObjectiveStatus::Active),
            Just(ObjectiveStatus::Completed),
            Just(ObjectiveStatus::Cancelled),
        ]
    }

    pub fn arb_category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Growth),
            Just(Category::Revenue),
            Just(Category::Customer),
            Just(Category::Product),
            Just(Category::Operations),
            Just(Category::People),
        ]
    }

    pub fn arb_metric_type() -> impl Strategy<Value = MetricType> {
        prop_oneof![
            Just(MetricType::Number),
            Just(MetricType::Percentage),
            Just(MetricType::Currency),
            Just(MetricType::Boolean),
        ]
    }

    // === Period Generators ===

    /// A date between 2023 and 2027. Days stop at 28 so every month is valid.
    pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (2023i32..=2027, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| fixtures::date(y, m, d))
    }

    /// A custom period of up to about 15 months.
    pub fn arb_period() -> impl Strategy<Value = Period> {
        (arb_date(), 0i64..450).prop_map(|(start, days)| {
            fixtures::custom_period(start, start + chrono::Duration::days(days))
        })
    }

    // === Entity Generators ===

    /// An objective whose ownership fields agree with its type.
    pub fn arb_objective() -> impl Strategy<Value = Objective> {
        (
            arb_company_id(),
            arb_workspace_id(),
            arb_user_id(),
            arb_objective_type(),
            arb_objective_status(),
            arb_period(),
            arb_category(),
            0u8..=100,
        )
            .prop_map(
                |(company, workspace, user, objective_type, status, period, category, progress)| {
                    let mut o = match objective_type {
                        ObjectiveType::Company => fixtures::company_objective(company, period),
                        ObjectiveType::Team => fixtures::team_objective(company, workspace, period),
                        ObjectiveType::Individual => {
                            fixtures::individual_objective(company, user, period)
                        }
                    };
                    o.status = status;
                    o.category = category;
                    o.progress = progress;
                    o
                },
            )
    }

    /// `(start, target, current)` valid for the metric type.
    pub fn arb_key_result_values(metric_type: MetricType) -> BoxedStrategy<(f64, f64, f64)> {
        match metric_type {
            MetricType::Number | MetricType::Currency => {
                let v = || (-1_000_000i32..1_000_000).prop_map(f64::from);
                (v(), v(), v()).boxed()
            }
            MetricType::Percentage => {
                let v = || (0u8..=100).prop_map(f64::from);
                (v(), v(), v()).boxed()
            }
            MetricType::Boolean => {
                let v = || prop_oneof![Just(0.0), Just(1.0)];
                (v(), v(), v()).boxed()
            }
        }
    }

    /// A configuration that passes validation.
    pub fn arb_valid_config() -> impl Strategy<Value = OkrConfig> {
        (
            prop::collection::vec(1970i32..=9999, 1..6),
            1usize..1000,
            any::<bool>(),
        )
            .prop_map(|(mut years, max_title_len, serialize_recompute)| {
                years.sort_unstable();
                years.dedup();
                OkrConfig {
                    supported_years: years,
                    max_title_len,
                    serialize_recompute,
                }
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records for common testing scenarios.
    //!
    //! Fixtures are written to stores directly, bypassing the engine, so
    //! derived fields (`progress`, `status`) hold whatever the test sets.

    use super::*;

    /// Calendar date; panics on an invalid date.
    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap_or_else(|| panic!("invalid fixture date {year}-{month}-{day}"))
    }

    /// Custom period; the year is taken from `start`.
    pub fn custom_period(start: NaiveDate, end: NaiveDate) -> Period {
        use chrono::Datelike;
        Period {
            year: start.year(),
            quarter: None,
            start_date: start,
            end_date: end,
        }
    }

    /// Period covering one calendar quarter.
    pub fn quarter_period(year: i32, quarter: Quarter) -> Period {
        let (start, end) = match quarter {
            Quarter::Q1 => (date(year, 1, 1), date(year, 3, 31)),
            Quarter::Q2 => (date(year, 4, 1), date(year, 6, 30)),
            Quarter::Q3 => (date(year, 7, 1), date(year, 9, 30)),
            Quarter::Q4 => (date(year, 10, 1), date(year, 12, 31)),
        };
        Period {
            year,
            quarter: Some(quarter),
            start_date: start,
            end_date: end,
        }
    }

    fn objective(company_id: CompanyId, objective_type: ObjectiveType, period: Period) -> Objective {
        let now = Utc::now();
        let author = UserId::now_v7();
        Objective {
            id: ObjectiveId::now_v7(),
            company_id,
            workspace_id: None,
            user_id: None,
            parent_objective_id: None,
            objective_type,
            level: objective_type.level(),
            title: format!("{objective_type} objective"),
            description: String::new(),
            category: Category::Growth,
            period,
            status: ObjectiveStatus::Active,
            progress: 0,
            visibility: Visibility::Workspace,
            aligned_with: BTreeSet::new(),
            tags: BTreeSet::new(),
            created_at: now,
            created_by: author,
            updated_at: now,
            updated_by: author,
        }
    }

    /// Active, public company objective.
    pub fn company_objective(company_id: CompanyId, period: Period) -> Objective {
        Objective {
            visibility: Visibility::Public,
            ..objective(company_id, ObjectiveType::Company, period)
        }
    }

    /// Active team objective in `workspace_id`.
    pub fn team_objective(company_id: CompanyId, workspace_id: WorkspaceId, period: Period) -> Objective {
        Objective {
            workspace_id: Some(workspace_id),
            ..objective(company_id, ObjectiveType::Team, period)
        }
    }

    /// Active individual objective owned by `user_id`.
    pub fn individual_objective(company_id: CompanyId, user_id: UserId, period: Period) -> Objective {
        Objective {
            user_id: Some(user_id),
            visibility: Visibility::Private,
            ..objective(company_id, ObjectiveType::Individual, period)
        }
    }

    /// Number key result from 0 to 100 whose current value equals
    /// `progress`. Status is left at its default.
    pub fn key_result_with_progress(objective: &Objective, progress: u8) -> KeyResult {
        let now = Utc::now();
        KeyResult {
            id: KeyResultId::now_v7(),
            objective_id: objective.id,
            company_id: objective.company_id,
            workspace_id: objective.workspace_id,
            title: format!("Reach {progress}"),
            description: String::new(),
            metric_type: MetricType::Number,
            start_value: 0.0,
            target_value: 100.0,
            current_value: f64::from(progress),
            unit: String::new(),
            status: KeyResultStatus::default(),
            progress,
            owner_id: objective.created_by,
            contributor_ids: BTreeSet::new(),
            updates: Vec::new(),
            due_date: None,
            created_at: now,
            created_by: objective.created_by,
            updated_at: now,
            updated_by: objective.created_by,
        }
    }

    /// Identity of a fresh signed-in user.
    pub fn signed_in() -> IdentityContext {
        IdentityContext::user(UserId::now_v7())
    }
}

// ============================================================================
// FAILURE INJECTION
// ============================================================================

mod flaky;
pub use flaky::FlakyStore;

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on OKR error kinds.

    use super::*;

    /// Assert that a result is a NotFound storage error for `entity_type`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &OkrResult<T>, entity_type: EntityType) {
        match result {
            Err(OkrError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &OkrResult<T>) {
        match result {
            Err(OkrError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_unauthenticated<T: std::fmt::Debug>(result: &OkrResult<T>) {
        match result {
            Err(OkrError::Auth(AuthError::Unauthenticated)) => {}
            other => panic!("Expected Unauthenticated, got: {:?}", other),
        }
    }

    /// Assert that a result is a rolled-back transaction.
    #[track_caller]
    pub fn assert_transaction_failed<T: std::fmt::Debug>(result: &OkrResult<T>) {
        match result {
            Err(OkrError::Storage(StorageError::TransactionFailed { .. })) => {}
            other => panic!("Expected TransactionFailed, got: {:?}", other),
        }
    }

    /// Assert that a configuration passes validation.
    #[track_caller]
    pub fn assert_config_valid(config: &OkrConfig) {
        if let Err(e) = config.validate() {
            panic!("Config validation failed: {:?}", e);
        }
    }
}

/// Route `tracing` output to the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seeded(store: &FlakyStore, key_results: u8) -> Objective {
        let objective = fixtures::company_objective(
            CompanyId::now_v7(),
            fixtures::quarter_period(2025, Quarter::Q1),
        );
        store.objective_insert(&objective).unwrap();
        for p in 0..key_results {
            store
                .key_result_insert(&fixtures::key_result_with_progress(&objective, p * 10))
                .unwrap();
        }
        objective
    }

    fn remaining(store: &FlakyStore, objective: &Objective) -> usize {
        store
            .key_result_query(&KeyResultFilter::for_objective(objective.id))
            .unwrap()
            .len()
    }

    #[test]
    fn test_quarter_period_fixture_bounds() {
        let q3 = fixtures::quarter_period(2024, Quarter::Q3);
        assert_eq!(q3.start_date, fixtures::date(2024, 7, 1));
        assert_eq!(q3.end_date, fixtures::date(2024, 9, 30));
        assert_eq!(q3.quarter, Some(Quarter::Q3));
    }

    #[test]
    fn test_objective_fixtures_are_coherent() {
        let period = fixtures::quarter_period(2025, Quarter::Q2);
        let company = CompanyId::now_v7();
        assert!(fixtures::company_objective(company, period).is_ownership_coherent());
        assert!(fixtures::team_objective(company, WorkspaceId::now_v7(), period)
            .is_ownership_coherent());
        assert!(fixtures::individual_objective(company, UserId::now_v7(), period)
            .is_ownership_coherent());
    }

    #[test]
    fn test_cascade_rolls_back_on_key_result_failure() {
        init_test_tracing();
        let store = FlakyStore::new();
        let objective = seeded(&store, 3);
        store.fail_key_result_delete_after(1);

        let result = store.delete_objective_with_dependents(objective.id);
        assertions::assert_transaction_failed(&result);
        assert!(store.objective_get(objective.id).unwrap().is_some());
        assert_eq!(remaining(&store, &objective), 3);
    }

    #[test]
    fn test_cascade_rolls_back_on_objective_failure() {
        let store = FlakyStore::new();
        let objective = seeded(&store, 2);
        store.fail_objective_delete();

        let result = store.delete_objective_with_dependents(objective.id);
        assertions::assert_transaction_failed(&result);
        assert_eq!(remaining(&store, &objective), 2);
    }

    #[test]
    fn test_cascade_reports_unrestored_records() {
        let store = FlakyStore::new();
        let objective = seeded(&store, 2);
        store.fail_objective_delete();
        store.fail_key_result_insert();

        let err = store
            .delete_objective_with_dependents(objective.id)
            .unwrap_err();
        assert!(err.to_string().contains("2 unrestored"), "{err}");
    }

    #[test]
    fn test_cascade_succeeds_without_faults() {
        let store = FlakyStore::new();
        let objective = seeded(&store, 4);

        let deletion = store.delete_objective_with_dependents(objective.id).unwrap();
        assert_eq!(deletion.record_count(), 5);
        assert!(store.objective_get(objective.id).unwrap().is_none());
        assert_eq!(remaining(&store, &objective), 0);
    }

    #[test]
    fn test_objective_query_failure_is_one_shot() {
        let store = FlakyStore::new();
        store.fail_objective_query_call(2);
        let filter = ObjectiveFilter::new();

        assert!(store.objective_query(&filter).is_ok());
        assert!(store.objective_query(&filter).is_err());
        assert!(store.objective_query(&filter).is_ok());
        assert_eq!(store.objective_query_calls(), 3);
    }

    #[test]
    fn test_assertion_not_found() {
        let result: OkrResult<()> = Err(OkrError::not_found(
            EntityType::KeyResult,
            KeyResultId::now_v7().as_uuid(),
        ));
        assertions::assert_not_found(&result, EntityType::KeyResult);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_objective_is_coherent(o in generators::arb_objective()) {
            prop_assert!(o.is_ownership_coherent());
            prop_assert_eq!(o.level, o.objective_type.level());
            prop_assert!(o.period.start_date <= o.period.end_date);
        }

        #[test]
        fn prop_generated_config_is_valid(config in generators::arb_valid_config()) {
            assertions::assert_config_valid(&config);
        }

        #[test]
        fn prop_generated_percentages_in_range(
            (s, t, c) in generators::arb_key_result_values(MetricType::Percentage)
        ) {
            for v in [s, t, c] {
                prop_assert!((0.0..=100.0).contains(&v));
            }
        }
    }
}
