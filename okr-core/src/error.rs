//! Error types for OKR operations

use crate::{EntityType, Quarter};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors, raised before any store mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to initialize telemetry: {reason}")]
    TelemetryInit { reason: String },
}

/// Identity errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No authenticated user in identity context")]
    Unauthenticated,
}

/// Errors from a single window of a multi-window aggregation.
///
/// These are collected and logged, never returned from a listing call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("Aggregation for {year} {quarter} failed: {reason}")]
    PartialFailure {
        year: i32,
        quarter: Quarter,
        reason: String,
    },
}

/// Master error type for all OKR errors.
#[derive(Debug, Clone, Error)]
pub enum OkrError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),
}

impl OkrError {
    /// Shorthand for `StorageError::NotFound`.
    pub fn not_found(entity_type: EntityType, id: Uuid) -> Self {
        OkrError::Storage(StorageError::NotFound { entity_type, id })
    }

    /// Shorthand for `ValidationError::InvalidValue`.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        OkrError::Validation(ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Whether this error reports a missing objective or key result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OkrError::Storage(StorageError::NotFound { .. }))
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            OkrError::Storage(StorageError::NotFound { entity_type, .. }) => {
                let what = match entity_type {
                    EntityType::Objective => "goal",
                    EntityType::KeyResult => "result",
                };
                format!("This {what} no longer exists, please refresh")
            }
            OkrError::Auth(AuthError::Unauthenticated) => "Please sign in again".to_string(),
            OkrError::Validation(ValidationError::RequiredFieldMissing { field }) => {
                format!("{field} is required")
            }
            OkrError::Validation(ValidationError::InvalidValue { field, reason }) => {
                format!("{field}: {reason}")
            }
            OkrError::Validation(ValidationError::ConstraintViolation { reason, .. }) => {
                reason.clone()
            }
            _ => "Something went wrong, please try again".to_string(),
        }
    }
}

/// Result type alias for OKR operations.
pub type OkrResult<T> = Result<T, OkrError>;

// =============================================================================
// TESTS
// =============================================================================
