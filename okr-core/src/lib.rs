//! OKR Core - Entity Types
//!
//! Pure data structures shared by every other crate: typed ids, enums,
//! entities, request payloads, errors and configuration.
//! This crate contains no storage or aggregation logic.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod requests;

pub use config::{OkrConfig, DEFAULT_MAX_TITLE_LEN, DEFAULT_SUPPORTED_YEARS};
pub use entities::{KeyResult, Objective, Okr, OkrSummary, Period, ValueUpdate};
pub use enums::{
    Category, EntityType, EnumParseError, KeyResultStatus, MetricType, ObjectiveStatus,
    ObjectiveType, PeriodView, Quarter, ScopeView, Visibility,
};
pub use error::{
    AggregationError, AuthError, ConfigError, OkrError, OkrResult, StorageError, ValidationError,
};
pub use identity::{
    CompanyId, EntityIdType, IdentityContext, KeyResultId, ObjectiveId, Timestamp, UserId,
    WorkspaceId,
};
pub use requests::{
    KeyResultPatch, NewKeyResult, NewObjective, ObjectivePatch, ObjectiveQuery, PeriodSpec,
};

// ============================================================================
// TESTS
// ============================================================================
