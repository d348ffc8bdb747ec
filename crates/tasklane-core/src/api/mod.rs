//! Request pipeline and the operations exposed to callers.
//!
//! Every operation takes a [`RequestContext`] and runs the same fixed steps:
//!
//! 1. resolve the caller (`NotAuthenticated` if absent)
//! 2. for mutations, count the request against its rate-limit action
//! 3. load the target, `NotFound` if missing, then check ownership
//! 4. validate and sanitize input
//! 5. write to the store
//! 6. append the audit entry
//!
//! Queries run steps 1 and 3 only. A failing step stops the pipeline; there
//! are no internal retries.

pub mod comments;
pub mod dashboard;
pub mod preferences;
pub mod tasks;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rusqlite::Connection;

use crate::auth::{Identity, IdentityProvider};
use crate::clock::{Clock, SystemClock};
use crate::config::{DashboardConfig, ProjectConfig};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::ratelimit::{RateLimitAction, RateLimiter, SqliteCounterStore};

/// Every operation callers can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTask,
    GetTask,
    UpdateTask,
    DeleteTask,
    ListTasks,
    ListTasksByStatus,
    ListTasksByPriority,
    ListOverdueTasks,
    ListUpcomingTasks,
    TaskStats,
    TaskHistory,
    CreateComment,
    GetComment,
    UpdateComment,
    DeleteComment,
    ListCommentsByTask,
    ListRecentComments,
    GetCommentCount,
    GetPreferences,
    UpdatePreferences,
    InitPreferences,
    DashboardSummary,
    RecentTasks,
    RecentActivity,
    TasksByPriority,
    CompletionStats,
    DashboardOverview,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTask => "createTask",
            Self::GetTask => "getTask",
            Self::UpdateTask => "updateTask",
            Self::DeleteTask => "deleteTask",
            Self::ListTasks => "listTasks",
            Self::ListTasksByStatus => "listByStatus",
            Self::ListTasksByPriority => "listByPriority",
            Self::ListOverdueTasks => "listOverdue",
            Self::ListUpcomingTasks => "listUpcoming",
            Self::TaskStats => "taskStats",
            Self::TaskHistory => "taskHistory",
            Self::CreateComment => "createComment",
            Self::GetComment => "getComment",
            Self::UpdateComment => "updateComment",
            Self::DeleteComment => "deleteComment",
            Self::ListCommentsByTask => "listCommentsByTask",
            Self::ListRecentComments => "listRecentComments",
            Self::GetCommentCount => "getCommentCount",
            Self::GetPreferences => "getPreferences",
            Self::UpdatePreferences => "updatePreferences",
            Self::InitPreferences => "initPreferences",
            Self::DashboardSummary => "dashboardSummary",
            Self::RecentTasks => "recentTasks",
            Self::RecentActivity => "recentActivity",
            Self::TasksByPriority => "tasksByPriority",
            Self::CompletionStats => "completionStats",
            Self::DashboardOverview => "dashboardOverview",
        }
    }

    /// The quota a request is counted against, if any.
    #[must_use]
    pub const fn rate_limit_action(self) -> Option<RateLimitAction> {
        match self {
            Self::CreateTask => Some(RateLimitAction::CreateTask),
            Self::UpdateTask => Some(RateLimitAction::UpdateTask),
            Self::DeleteTask => Some(RateLimitAction::DeleteTask),
            Self::CreateComment => Some(RateLimitAction::CreateComment),
            Self::UpdateComment => Some(RateLimitAction::UpdateComment),
            Self::DeleteComment => Some(RateLimitAction::DeleteComment),
            Self::UpdatePreferences => Some(RateLimitAction::UpdatePreferences),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handles every request runs against: the store, the limiter, and
/// the clock.
pub struct Backend {
    conn: Connection,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    dashboard: DashboardConfig,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("limiter", &self.limiter)
            .field("dashboard", &self.dashboard)
            .finish_non_exhaustive()
    }
}

impl Backend {
    #[must_use]
    pub fn new(conn: Connection, limiter: RateLimiter, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn,
            limiter,
            clock,
            dashboard: DashboardConfig::default(),
        }
    }

    #[must_use]
    pub fn with_dashboard(mut self, dashboard: DashboardConfig) -> Self {
        self.dashboard = dashboard;
        self
    }

    /// Open the on-disk store for a project. Rate-limit counters live in the
    /// same database so separate processes share quota.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or migrated.
    pub fn open(root: &Path, config: &ProjectConfig) -> anyhow::Result<Self> {
        let path = config.store_path(root);
        let conn = db::open_store(&path)
            .with_context(|| format!("open task store at {}", path.display()))?;
        Ok(Self::on_disk(conn, &path, config))
    }

    /// Like [`Backend::open`], but never creates the store. Returns
    /// `Ok(None)` when the project has no store yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be opened or migrated.
    pub fn open_existing(root: &Path, config: &ProjectConfig) -> anyhow::Result<Option<Self>> {
        let path = config.store_path(root);
        let conn = db::try_open_store(&path)
            .with_context(|| format!("open task store at {}", path.display()))?;
        Ok(conn.map(|conn| Self::on_disk(conn, &path, config)))
    }

    fn on_disk(conn: Connection, path: &Path, config: &ProjectConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let limiter = RateLimiter::new(Box::new(SqliteCounterStore::new(path)), Arc::clone(&clock))
            .enabled(config.rate_limit.enabled);
        tracing::debug!(
            path = %path.display(),
            rate_limit = limiter.is_enabled(),
            "task store opened"
        );
        Self::new(conn, limiter, clock).with_dashboard(config.dashboard.clone())
    }

    /// In-memory store with an in-process limiter.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory(clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let conn = db::open_in_memory()?;
        let limiter = RateLimiter::in_memory(Arc::clone(&clock));
        Ok(Self::new(conn, limiter, clock))
    }

    /// Start a request whose caller is resolved once, now.
    pub fn request(&self, identity: &dyn IdentityProvider) -> RequestContext<'_> {
        RequestContext {
            backend: self,
            caller: identity.resolve_identity(),
        }
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    #[must_use]
    pub const fn dashboard_config(&self) -> &DashboardConfig {
        &self.dashboard
    }
}

/// One request: the backend plus the caller resolved for it.
#[derive(Debug)]
pub struct RequestContext<'a> {
    backend: &'a Backend,
    caller: Option<Identity>,
}

impl<'a> RequestContext<'a> {
    #[must_use]
    pub const fn caller(&self) -> Option<&Identity> {
        self.caller.as_ref()
    }

    #[must_use]
    pub const fn backend(&self) -> &'a Backend {
        self.backend
    }

    pub(crate) const fn conn(&self) -> &'a Connection {
        &self.backend.conn
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.backend.now_ms()
    }

    /// Steps 1 and 2: authenticate, then count the request against the
    /// operation's quota.
    pub(crate) fn begin(&self, op: Operation) -> ApiResult<&Identity> {
        let Some(identity) = self.caller.as_ref() else {
            tracing::debug!(op = op.as_str(), "rejected: not authenticated");
            return Err(ApiError::Unauthenticated);
        };

        if let Some(action) = op.rate_limit_action() {
            let decision = self.backend.limiter.check(action, identity.as_str())?;
            if !decision.allowed {
                tracing::warn!(
                    op = op.as_str(),
                    user = identity.as_str(),
                    retry_after_ms = decision.retry_after_ms,
                    "rejected: rate limit exceeded"
                );
                return Err(ApiError::RateLimited {
                    action: action.as_str(),
                    retry_after_ms: decision.retry_after_ms,
                });
            }
        }

        tracing::debug!(op = op.as_str(), user = identity.as_str(), "request admitted");
        Ok(identity)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::auth::FixedIdentity;
    use crate::clock::ManualClock;

    pub const NOW: i64 = 1_700_000_040_000;

    pub fn backend() -> (Backend, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(NOW));
        let backend = Backend::in_memory(clock.clone()).expect("in-memory backend");
        (backend, clock)
    }

    pub fn as_user(user: &str) -> FixedIdentity {
        FixedIdentity::user(user)
    }
}
