//! Configuration types

use crate::{ConfigError, OkrError, OkrResult};
use serde::{Deserialize, Serialize};

/// Default years scanned by `PeriodView::All` listings.
pub const DEFAULT_SUPPORTED_YEARS: [i32; 3] = [2024, 2025, 2026];

/// Default maximum length of objective and key result titles.
pub const DEFAULT_MAX_TITLE_LEN: usize = 200;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OkrConfig {
    /// Years scanned by an "all" listing, in ascending order
    pub supported_years: Vec<i32>,
    /// Maximum title length in characters
    pub max_title_len: usize,
    /// Serialize objective progress recomputes per objective within this process
    pub serialize_recompute: bool,
}

impl Default for OkrConfig {
    fn default() -> Self {
        Self {
            supported_years: DEFAULT_SUPPORTED_YEARS.to_vec(),
            max_title_len: DEFAULT_MAX_TITLE_LEN,
            serialize_recompute: true,
        }
    }
}

impl OkrConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `OKR_SUPPORTED_YEARS`: comma-separated years (default: 2024,2025,2026)
    /// - `OKR_MAX_TITLE_LEN`: maximum title length (default: 200)
    /// - `OKR_SERIALIZE_RECOMPUTE`: serialize recomputes per objective (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            supported_years: std::env::var("OKR_SUPPORTED_YEARS")
                .ok()
                .and_then(|s| parse_years(&s))
                .unwrap_or(defaults.supported_years),
            max_title_len: std::env::var("OKR_MAX_TITLE_LEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_title_len),
            serialize_recompute: std::env::var("OKR_SERIALIZE_RECOMPUTE")
                .ok()
                .map(|s| s.to_lowercase() != "false" && s != "0")
                .unwrap_or(defaults.serialize_recompute),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - supported_years is non-empty
    /// - every supported year lies in 1970..=9999
    /// - max_title_len > 0
    pub fn validate(&self) -> OkrResult<()> {
        if self.supported_years.is_empty() {
            return Err(OkrError::Config(ConfigError::InvalidValue {
                field: "supported_years".to_string(),
                value: "[]".to_string(),
                reason: "at least one year is required".to_string(),
            }));
        }

        if let Some(year) = self
            .supported_years
            .iter()
            .find(|y| !(1970..=9999).contains(*y))
        {
            return Err(OkrError::Config(ConfigError::InvalidValue {
                field: "supported_years".to_string(),
                value: year.to_string(),
                reason: "years must lie between 1970 and 9999".to_string(),
            }));
        }

        if self.max_title_len == 0 {
            return Err(OkrError::Config(ConfigError::InvalidValue {
                field: "max_title_len".to_string(),
                value: "0".to_string(),
                reason: "max_title_len must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }
}

/// Parse a comma-separated year list, sorted and deduplicated.
/// Returns `None` if any entry fails to parse.
fn parse_years(raw: &str) -> Option<Vec<i32>> {
    let mut years = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i32>().ok())
        .collect::<Option<Vec<_>>>()?;
    years.sort_unstable();
    years.dedup();
    Some(years)
}
