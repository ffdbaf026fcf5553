//! Period resolution: quarter and year bounds, overlap tests.

use chrono::{Datelike, NaiveDate};
use okr_core::{OkrError, OkrResult, Period, PeriodSpec, Quarter};

fn date(year: i32, month: u32, day: u32) -> OkrResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| OkrError::invalid("year", format!("{year} is outside the supported calendar")))
}

/// Parse a raw quarter number, rejecting anything outside 1..=4.
pub fn parse_quarter(raw: u8) -> OkrResult<Quarter> {
    Quarter::try_from(raw).map_err(|_| OkrError::invalid("quarter", format!("{raw} is not in 1..=4")))
}

/// First day of the quarter: Jan 1, Apr 1, Jul 1 or Oct 1.
pub fn quarter_start(year: i32, quarter: Quarter) -> OkrResult<NaiveDate> {
    let month = match quarter {
        Quarter::Q1 => 1,
        Quarter::Q2 => 4,
        Quarter::Q3 => 7,
        Quarter::Q4 => 10,
    };
    date(year, month, 1)
}

/// Last day of the quarter: Mar 31, Jun 30, Sep 30 or Dec 31.
pub fn quarter_end(year: i32, quarter: Quarter) -> OkrResult<NaiveDate> {
    match quarter {
        Quarter::Q1 => date(year, 3, 31),
        Quarter::Q2 => date(year, 6, 30),
        Quarter::Q3 => date(year, 9, 30),
        Quarter::Q4 => date(year, 12, 31),
    }
}

pub fn year_start(year: i32) -> OkrResult<NaiveDate> {
    date(year, 1, 1)
}

pub fn year_end(year: i32) -> OkrResult<NaiveDate> {
    date(year, 12, 31)
}

/// Quarter containing `date`.
pub fn quarter_of(date: NaiveDate) -> Quarter {
    // chrono months are always 1..=12
    Quarter::from_month(date.month()).unwrap_or(Quarter::Q4)
}

/// Inclusive interval intersection.
///
/// Objectives with custom ranges are matched by overlap, not containment.
pub fn overlaps(
    obj_start: NaiveDate,
    obj_end: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> bool {
    obj_start <= window_end && obj_end >= window_start
}

/// Turn a creation-time period request into stored period bounds.
pub fn resolve_period(spec: PeriodSpec) -> OkrResult<Period> {
    match spec {
        PeriodSpec::Quarter { year, quarter } => Ok(Period {
            year,
            quarter: Some(quarter),
            start_date: quarter_start(year, quarter)?,
            end_date: quarter_end(year, quarter)?,
        }),
        PeriodSpec::Year { year } => Ok(Period {
            year,
            quarter: None,
            start_date: year_start(year)?,
            end_date: year_end(year)?,
        }),
        PeriodSpec::Custom {
            start_date,
            end_date,
        } => {
            if start_date > end_date {
                return Err(OkrError::invalid(
                    "end_date",
                    format!("{end_date} is before start date {start_date}"),
                ));
            }
            Ok(Period {
                year: start_date.year(),
                quarter: None,
                start_date,
                end_date,
            })
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The four quarters tile the year: each starts the day after the
        /// previous one ends.
        #[test]
        fn prop_quarters_tile_year(year in 1970i32..2200) {
            prop_assert_eq!(quarter_start(year, Quarter::Q1).unwrap(), year_start(year).unwrap());
            prop_assert_eq!(quarter_end(year, Quarter::Q4).unwrap(), year_end(year).unwrap());
            for pair in Quarter::ALL.windows(2) {
                let end = quarter_end(year, pair[0]).unwrap();
                let next = quarter_start(year, pair[1]).unwrap();
                prop_assert_eq!(end.succ_opt().unwrap(), next);
            }
        }

        /// Overlap is symmetric.
        #[test]
        fn prop_overlap_symmetric(a in 0i64..1000, b in 0i64..1000, c in 0i64..1000, e in 0i64..1000) {
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let day = |n: i64| base + chrono::Duration::days(n);
            let (s1, e1) = (day(a.min(b)), day(a.max(b)));
            let (s2, e2) = (day(c.min(e)), day(c.max(e)));
            prop_assert_eq!(overlaps(s1, e1, s2, e2), overlaps(s2, e2, s1, e1));
        }

        /// Every date lies inside the window of its own quarter.
        #[test]
        fn prop_date_inside_own_quarter(offset in 0i64..3650) {
            let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset);
            let q = quarter_of(date);
            let start = quarter_start(date.year(), q).unwrap();
            let end = quarter_end(date.year(), q).unwrap();
            prop_assert!(start <= date && date <= end);
        }
    }
}
