//! Aggregation query engine.
//!
//! Lists active objectives for a scope (company, team, individual or all)
//! over a period (one quarter, a year, or every supported year). Each quarter
//! window is queried independently; a window whose store query fails
//! contributes nothing and the listing carries on with the rest.

use crate::period::{overlaps, parse_quarter, quarter_end, quarter_of, quarter_start, year_start};
use chrono::{Datelike, NaiveDate, Utc};
use okr_core::{
    AggregationError, Objective, ObjectiveId, ObjectiveQuery, ObjectiveStatus, ObjectiveType,
    OkrConfig, OkrError, OkrResult, PeriodView, Quarter, ScopeView,
};
use okr_storage::{ObjectiveFilter, OkrStore};
use std::collections::HashSet;
use std::sync::Arc;

/// Objectives of a listing plus the quarter windows that could not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub objectives: Vec<Objective>,
    pub failures: Vec<AggregationError>,
}

impl AggregationReport {
    /// True when every window was read.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct AggregationEngine<S: OkrStore> {
    store: Arc<S>,
    config: Arc<OkrConfig>,
}

impl<S: OkrStore> AggregationEngine<S> {
    pub fn new(store: Arc<S>, config: Arc<OkrConfig>) -> Self {
        Self { store, config }
    }

    /// Objectives matching the query, deduplicated by id, in no particular
    /// order. Failed windows are logged and skipped.
    pub fn list_objectives(&self, query: &ObjectiveQuery) -> OkrResult<Vec<Objective>> {
        self.list_objectives_detailed(query).map(|r| r.objectives)
    }

    /// Like [`list_objectives`](Self::list_objectives), also reporting the
    /// windows that failed.
    pub fn list_objectives_detailed(&self, query: &ObjectiveQuery) -> OkrResult<AggregationReport> {
        self.list_objectives_on(query, Utc::now().date_naive())
    }

    /// Listing with an explicit "today", which supplies the default year and
    /// quarter.
    pub fn list_objectives_on(
        &self,
        query: &ObjectiveQuery,
        today: NaiveDate,
    ) -> OkrResult<AggregationReport> {
        let filters = scope_filters(query)?;
        let windows = self.windows(query, today)?;

        let mut seen: HashSet<ObjectiveId> = HashSet::new();
        let mut report = AggregationReport::default();

        for (year, quarter) in windows {
            match self.quarter_window(&filters, year, quarter) {
                Ok(found) => {
                    for objective in found {
                        if seen.insert(objective.id) {
                            report.objectives.push(objective);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        year,
                        quarter = %quarter,
                        error = %e,
                        "Quarter window failed, continuing without it"
                    );
                    report.failures.push(AggregationError::PartialFailure {
                        year,
                        quarter,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            view = %query.view,
            period = %query.period,
            objectives = report.objectives.len(),
            failed_windows = report.failures.len(),
            "Objectives aggregated"
        );
        Ok(report)
    }

    /// The (year, quarter) windows a query covers.
    fn windows(&self, query: &ObjectiveQuery, today: NaiveDate) -> OkrResult<Vec<(i32, Quarter)>> {
        let year = query.year.unwrap_or_else(|| today.year());

        match query.period {
            PeriodView::Quarter => {
                let quarter = match query.quarter {
                    Some(raw) => parse_quarter(raw)?,
                    None => quarter_of(today),
                };
                year_start(year)?;
                Ok(vec![(year, quarter)])
            }
            PeriodView::Year => {
                year_start(year)?;
                Ok(Quarter::ALL.iter().map(|q| (year, *q)).collect())
            }
            PeriodView::All => Ok(self
                .config
                .supported_years
                .iter()
                .flat_map(|y| Quarter::ALL.iter().map(move |q| (*y, *q)))
                .collect()),
        }
    }

    /// Active objectives in scope whose period overlaps one quarter.
    fn quarter_window(
        &self,
        filters: &[ObjectiveFilter],
        year: i32,
        quarter: Quarter,
    ) -> OkrResult<Vec<Objective>> {
        let start = quarter_start(year, quarter)?;
        let end = quarter_end(year, quarter)?;

        let mut found = Vec::new();
        for filter in filters {
            let candidates = self.store.objective_query(filter)?;
            found.extend(
                candidates
                    .into_iter()
                    .filter(|o| overlaps(o.period.start_date, o.period.end_date, start, end)),
            );
        }
        Ok(found)
    }
}

/// Store filters for the query's scope. `All` yields one filter per scope
/// the query has enough context for.
pub fn scope_filters(query: &ObjectiveQuery) -> OkrResult<Vec<ObjectiveFilter>> {
    let mut base = ObjectiveFilter::new().status(ObjectiveStatus::Active);
    if let Some(company_id) = query.company_id {
        base = base.company(company_id);
    }

    let company = base.objective_type(ObjectiveType::Company);
    let team = query
        .workspace_id
        .map(|w| base.objective_type(ObjectiveType::Team).workspace(w));
    let individual = query.user_id.map(|u| {
        let f = base.objective_type(ObjectiveType::Individual).user(u);
        match query.workspace_id {
            Some(w) => f.workspace(w),
            None => f,
        }
    });

    match query.view {
        ScopeView::Company => Ok(vec![company]),
        ScopeView::Team => team
            .map(|f| vec![f])
            .ok_or_else(|| OkrError::invalid("workspace_id", "required for the team view")),
        ScopeView::Individual => individual
            .map(|f| vec![f])
            .ok_or_else(|| OkrError::invalid("user_id", "required for the individual view")),
        ScopeView::All => Ok(std::iter::once(company)
            .chain(team)
            .chain(individual)
            .collect()),
    }
}
