//! Enum types for OKR entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing an enum from its stored string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

/// Implements `as_db_str`, `from_db_str`, `Display` and `FromStr` from a
/// single variant/string table.
macro_rules! db_string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $name {
            /// Convert to database string representation.
            pub fn as_db_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $s,)+
                }
            }

            /// Parse from database string representation.
            pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
                match s.to_lowercase().as_str() {
                    $($s => Ok($name::$variant),)+
                    _ => Err(EnumParseError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_db_str())
            }
        }

        impl FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_db_str(s)
            }
        }
    };
}

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Entity type discriminator used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Objective,
    KeyResult,
}

/// Ownership scope of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    Company,
    Team,
    Individual,
}

impl ObjectiveType {
    /// Hierarchy depth: company=0, team=1, individual=2.
    pub fn level(&self) -> u8 {
        match self {
            ObjectiveType::Company => 0,
            ObjectiveType::Team => 1,
            ObjectiveType::Individual => 2,
        }
    }
}

db_string_enum!(ObjectiveType, "objective type", {
    Company => "company",
    Team => "team",
    Individual => "individual",
});

/// Lifecycle status of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    Draft,
    /// Only active objectives are returned by period listings
    #[default]
    Active,
    Completed,
    Cancelled,
}

db_string_enum!(ObjectiveStatus, "objective status", {
    Draft => "draft",
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Business category of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Growth,
    Revenue,
    Customer,
    Product,
    Operations,
    People,
}

db_string_enum!(Category, "category", {
    Growth => "growth",
    Revenue => "revenue",
    Customer => "customer",
    Product => "product",
    Operations => "operations",
    People => "people",
});

/// Who can see an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Workspace,
    Private,
}

db_string_enum!(Visibility, "visibility", {
    Public => "public",
    Workspace => "workspace",
    Private => "private",
});

/// How a key result's values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Number,
    /// Values bounded to [0, 100]
    Percentage,
    Currency,
    /// Values restricted to 0 (not done) and 1 (done)
    Boolean,
}

db_string_enum!(MetricType, "metric type", {
    Number => "number",
    Percentage => "percentage",
    Currency => "currency",
    Boolean => "boolean",
});

/// Health of a key result, derived from its progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum KeyResultStatus {
    #[default]
    NotStarted,
    OnTrack,
    AtRisk,
    Completed,
    Missed,
}

db_string_enum!(KeyResultStatus, "key result status", {
    NotStarted => "not_started",
    OnTrack => "on_track",
    AtRisk => "at_risk",
    Completed => "completed",
    Missed => "missed",
});

// ============================================================================
// QUERY ENUMS
// ============================================================================

/// Time selection of an objective listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PeriodView {
    #[default]
    Quarter,
    Year,
    All,
}

db_string_enum!(PeriodView, "period view", {
    Quarter => "quarter",
    Year => "year",
    All => "all",
});

/// Ownership selection of an objective listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ScopeView {
    Company,
    Team,
    Individual,
    #[default]
    All,
}

db_string_enum!(ScopeView, "scope view", {
    Company => "company",
    Team => "team",
    Individual => "individual",
    All => "all",
});

/// Calendar quarter. Serialized as its number (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// All quarters in calendar order.
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Quarter number, 1 through 4.
    pub fn number(&self) -> u8 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    /// Quarter containing the given calendar month (1-12).
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            1..=3 => Some(Quarter::Q1),
            4..=6 => Some(Quarter::Q2),
            7..=9 => Some(Quarter::Q3),
            10..=12 => Some(Quarter::Q4),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Quarter {
    type Error = EnumParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Quarter::Q1),
            2 => Ok(Quarter::Q2),
            3 => Ok(Quarter::Q3),
            4 => Ok(Quarter::Q4),
            other => Err(EnumParseError {
                kind: "quarter",
                value: other.to_string(),
            }),
        }
    }
}

impl From<Quarter> for u8 {
    fn from(q: Quarter) -> Self {
        q.number()
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}
