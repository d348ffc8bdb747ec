//! Caller identity and ownership checks.

use std::fmt;

use serde::Serialize;

use crate::error::{ApiError, ApiResult, Resource};
use crate::model::{Task, TaskComment};

/// An authenticated user id. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Returns `None` for a blank id.
    #[must_use]
    pub fn new(user_id: &str) -> Option<Self> {
        let trimmed = user_id.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the caller's identity for one request.
pub trait IdentityProvider {
    fn resolve_identity(&self) -> Option<Identity>;
}

/// Provider that always answers the same way.
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity(Option<Identity>);

impl FixedIdentity {
    #[must_use]
    pub fn user(user_id: &str) -> Self {
        Self(Identity::new(user_id))
    }

    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for FixedIdentity {
    fn resolve_identity(&self) -> Option<Identity> {
        self.0.clone()
    }
}

/// A record that belongs to exactly one user.
pub trait Owned {
    const RESOURCE: Resource;

    fn owner_id(&self) -> &str;
}

impl Owned for Task {
    const RESOURCE: Resource = Resource::Task;

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Owned for TaskComment {
    const RESOURCE: Resource = Resource::Comment;

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// # Errors
///
/// Returns [`ApiError::Unauthorized`] if `identity` does not own `record`.
pub fn assert_owner<T: Owned>(record: &T, identity: &Identity) -> ApiResult<()> {
    if record.owner_id() == identity.as_str() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized(T::RESOURCE))
    }
}

/// Resolve a looked-up record into one the caller may use: a missing row is
/// `NotFound`, someone else's row is `Unauthorized`.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] or [`ApiError::Unauthorized`].
pub fn require_owned<T: Owned>(record: Option<T>, id: i64, identity: &Identity) -> ApiResult<T> {
    let record = record.ok_or(ApiError::NotFound {
        resource: T::RESOURCE,
        id,
    })?;
    assert_owner(&record, identity)?;
    Ok(record)
}
