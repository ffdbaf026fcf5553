//! Input validation, run before any store mutation.

use okr_core::{MetricType, OkrError, OkrResult, ValidationError};

/// Titles must be non-blank and at most `max_len` characters.
pub fn validate_title(field: &str, title: &str, max_len: usize) -> OkrResult<()> {
    if title.trim().is_empty() {
        return Err(OkrError::Validation(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        }));
    }
    let len = title.chars().count();
    if len > max_len {
        return Err(OkrError::invalid(
            field,
            format!("must be at most {max_len} characters, got {len}"),
        ));
    }
    Ok(())
}

/// Check one value against the rules of its metric type.
pub fn validate_metric_value(metric_type: MetricType, field: &str, value: f64) -> OkrResult<()> {
    if !value.is_finite() {
        return Err(OkrError::invalid(field, "must be a finite number"));
    }
    match metric_type {
        MetricType::Number | MetricType::Currency => Ok(()),
        MetricType::Percentage if (0.0..=100.0).contains(&value) => Ok(()),
        MetricType::Percentage => Err(OkrError::invalid(field, "must be between 0 and 100")),
        MetricType::Boolean if value == 0.0 || value == 1.0 => Ok(()),
        MetricType::Boolean => Err(OkrError::invalid(field, "must be 0 or 1")),
    }
}

/// Check the start, target and current values of a key result together.
pub fn validate_key_result_values(
    metric_type: MetricType,
    start_value: f64,
    target_value: f64,
    current_value: f64,
) -> OkrResult<()> {
    validate_metric_value(metric_type, "start_value", start_value)?;
    validate_metric_value(metric_type, "target_value", target_value)?;
    validate_metric_value(metric_type, "current_value", current_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_is_missing() {
        let err = validate_title("title", "   ", 200).unwrap_err();
        assert!(matches!(
            err,
            OkrError::Validation(ValidationError::RequiredFieldMissing { field }) if field == "title"
        ));
    }

    #[test]
    fn test_long_title_is_invalid() {
        let title = "x".repeat(21);
        assert!(validate_title("title", &title, 20).is_err());
        assert!(validate_title("title", &title[..20], 20).is_ok());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        for metric in [MetricType::Number, MetricType::Currency] {
            assert!(validate_metric_value(metric, "target_value", f64::NAN).is_err());
            assert!(validate_metric_value(metric, "target_value", f64::INFINITY).is_err());
            assert!(validate_metric_value(metric, "target_value", -42.5).is_ok());
        }
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(validate_metric_value(MetricType::Percentage, "v", 0.0).is_ok());
        assert!(validate_metric_value(MetricType::Percentage, "v", 100.0).is_ok());
        assert!(validate_metric_value(MetricType::Percentage, "v", 100.5).is_err());
        assert!(validate_metric_value(MetricType::Percentage, "v", -1.0).is_err());
    }

    #[test]
    fn test_boolean_values() {
        assert!(validate_key_result_values(MetricType::Boolean, 0.0, 1.0, 0.0).is_ok());
        let err = validate_key_result_values(MetricType::Boolean, 0.0, 2.0, 0.0).unwrap_err();
        assert_eq!(err.user_message(), "target_value: must be 0 or 1");
    }
}
