//! Progress calculation.
//!
//! Pure functions; every derived `progress` and `status` in the engine goes
//! through here.

use okr_core::{KeyResultStatus, Objective, ObjectiveStatus, OkrSummary};

/// Percentage of the way from `start` to `target`, clamped to 0..=100.
///
/// A key result whose target equals its start counts as 100% regardless of
/// the current value. Decreasing targets (target below start) work the same
/// way: moving down toward the target raises progress.
pub fn compute_key_result_progress(start: f64, current: f64, target: f64) -> u8 {
    if target == start {
        return 100;
    }

    let ratio = (current - start) / (target - start) * 100.0;
    if ratio.is_nan() {
        return 0;
    }
    ratio.round().clamp(0.0, 100.0) as u8
}

/// Rounded mean of the key results' progress; 0 when there are none.
pub fn compute_objective_progress(key_result_progress: &[u8]) -> u8 {
    mean_rounded(key_result_progress.iter().map(|p| u64::from(*p)))
}

/// Status band for a progress value.
pub fn derive_status(progress: u8) -> KeyResultStatus {
    match progress {
        0 => KeyResultStatus::NotStarted,
        1..=39 => KeyResultStatus::Missed,
        40..=69 => KeyResultStatus::AtRisk,
        70..=99 => KeyResultStatus::OnTrack,
        _ => KeyResultStatus::Completed,
    }
}

/// Counts per status and the mean progress of a set of objectives.
pub fn summarize(objectives: &[Objective]) -> OkrSummary {
    let mut summary = OkrSummary {
        total: objectives.len(),
        ..OkrSummary::default()
    };

    for o in objectives {
        match o.status {
            ObjectiveStatus::Draft => summary.draft += 1,
            ObjectiveStatus::Active => summary.active += 1,
            ObjectiveStatus::Completed => summary.completed += 1,
            ObjectiveStatus::Cancelled => summary.cancelled += 1,
        }
    }
    summary.average_progress = mean_rounded(objectives.iter().map(|o| u64::from(o.progress)));
    summary
}

/// Integer mean with halves rounded up.
fn mean_rounded(values: impl Iterator<Item = u64>) -> u8 {
    let (sum, count) = values.fold((0u64, 0u64), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return 0;
    }
    let mean = (2 * sum + count) / (2 * count);
    mean.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_basic_ratio() {
        assert_eq!(compute_key_result_progress(0.0, 50.0, 100.0), 50);
        assert_eq!(compute_key_result_progress(10.0, 15.0, 20.0), 50);
    }

    #[test]
    fn test_progress_clamps() {
        assert_eq!(compute_key_result_progress(0.0, 150.0, 100.0), 100);
        assert_eq!(compute_key_result_progress(0.0, -20.0, 100.0), 0);
    }

    #[test]
    fn test_progress_rounds_half_up() {
        // 1/8 = 12.5%
        assert_eq!(compute_key_result_progress(0.0, 1.0, 8.0), 13);
        // 2/3 = 66.67%
        assert_eq!(compute_key_result_progress(0.0, 2.0, 3.0), 67);
    }

    #[test]
    fn test_progress_equal_bounds_is_complete() {
        assert_eq!(compute_key_result_progress(0.0, 0.0, 0.0), 100);
        assert_eq!(compute_key_result_progress(5.0, -3.0, 5.0), 100);
    }

    #[test]
    fn test_progress_decreasing_target() {
        // Churn from 10% down to 5%, currently 7.5%
        assert_eq!(compute_key_result_progress(10.0, 7.5, 5.0), 50);
    }

    #[test]
    fn test_objective_progress_mean() {
        assert_eq!(compute_objective_progress(&[]), 0);
        assert_eq!(compute_objective_progress(&[80, 40]), 60);
        assert_eq!(compute_objective_progress(&[50, 51]), 51);
        assert_eq!(compute_objective_progress(&[0, 0, 1]), 0);
        assert_eq!(compute_objective_progress(&[100, 100]), 100);
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(derive_status(0), KeyResultStatus::NotStarted);
        assert_eq!(derive_status(1), KeyResultStatus::Missed);
        assert_eq!(derive_status(39), KeyResultStatus::Missed);
        assert_eq!(derive_status(40), KeyResultStatus::AtRisk);
        assert_eq!(derive_status(69), KeyResultStatus::AtRisk);
        assert_eq!(derive_status(70), KeyResultStatus::OnTrack);
        assert_eq!(derive_status(99), KeyResultStatus::OnTrack);
        assert_eq!(derive_status(100), KeyResultStatus::Completed);
    }
}
