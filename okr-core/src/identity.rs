//! Identity types for OKR entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behavior of the strongly-typed entity identifiers.
///
/// Every id wraps a UUIDv7, so ids sort by creation time.
pub trait EntityIdType:
    Copy + Eq + std::hash::Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Wrap an existing UUID.
    fn new(uuid: Uuid) -> Self;

    /// Generate a fresh timestamp-sortable id.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }

    /// Borrow the underlying UUID.
    fn as_uuid(&self) -> Uuid;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of an objective.
    ObjectiveId
);
define_entity_id!(
    /// Identifier of a key result.
    KeyResultId
);
define_entity_id!(
    /// Identifier of the owning company.
    CompanyId
);
define_entity_id!(
    /// Identifier of a workspace (team).
    WorkspaceId
);
define_entity_id!(
    /// Identifier of a user, as supplied by the identity provider.
    UserId
);

// ============================================================================
// CALLER IDENTITY
// ============================================================================

/// Identity of the caller, supplied explicitly on every mutating call.
///
/// Authentication happens upstream; an anonymous context only exists so the
/// engine can reject calls that arrive without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentityContext {
    user_id: Option<UserId>,
}

impl IdentityContext {
    /// Identity for an authenticated user.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Identity with no authenticated user.
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// The acting user, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The acting user, or `AuthError::Unauthenticated`.
    pub fn require_user(&self) -> crate::OkrResult<UserId> {
        self.user_id
            .ok_or_else(|| crate::OkrError::Auth(crate::AuthError::Unauthenticated))
    }
}
