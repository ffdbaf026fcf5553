//! OKR Engine - Progress, Cascades and Aggregation
//!
//! Builds on `okr-core` types and any `okr-storage` backend:
//! - `progress`: key-result and objective progress, status bands, summaries
//! - `period`: quarter/year bounds and overlap tests
//! - `cascade`: atomic deletes and guarded parent recomputes
//! - `aggregation`: scope and period listings with partial-failure tolerance
//! - `service`: the public mutation and read API
//!
//! All operations are synchronous.

pub mod aggregation;
pub mod cascade;
pub mod locks;
pub mod period;
pub mod progress;
pub mod service;
pub mod telemetry;
pub mod validate;

pub use aggregation::{scope_filters, AggregationEngine, AggregationReport};
pub use cascade::{CascadeManager, KeyResultChange};
pub use locks::RecomputeLocks;
pub use period::{
    overlaps, parse_quarter, quarter_end, quarter_of, quarter_start, resolve_period, year_end,
    year_start,
};
pub use progress::{
    compute_key_result_progress, compute_objective_progress, derive_status, summarize,
};
pub use service::OkrService;
pub use telemetry::{init_tracing, TelemetryConfig, DEFAULT_LOG_FILTER};
pub use validate::{validate_key_result_values, validate_metric_value, validate_title};
