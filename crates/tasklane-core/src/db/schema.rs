//! SQLite schema for the task store.
//!
//! - `tasks` holds one row per task, owned by `user_id`
//! - `task_comments` and `task_activity` point at a task by id only; neither
//!   carries a foreign key, so comments outlive their task and activity is
//!   purged explicitly
//! - `user_preferences` keeps at most one row per user
//! - `rate_limit_counters` stores limiter state keyed by (action, identity)
//!
//! Timestamps are epoch milliseconds in `*_ms` columns.

/// Migration v1: entity tables, their lookup indexes, and store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL CHECK (length(trim(user_id)) > 0),
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL CHECK (status IN ('pending', 'in_progress', 'completed')),
    priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high')),
    due_date_ms INTEGER,
    completed_at_ms INTEGER,
    created_at_ms INTEGER NOT NULL,
    updated_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS task_comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL,
    updated_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS task_activity (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    action TEXT NOT NULL
        CHECK (action IN ('created', 'updated', 'completed', 'deleted', 'commented')),
    metadata_json TEXT,
    created_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS user_preferences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL UNIQUE,
    theme TEXT NOT NULL CHECK (theme IN ('light', 'dark', 'system')),
    default_view TEXT NOT NULL CHECK (default_view IN ('list', 'board')),
    default_filter TEXT,
    notifications_enabled INTEGER NOT NULL CHECK (notifications_enabled IN (0, 1)),
    created_at_ms INTEGER NOT NULL,
    updated_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);

CREATE INDEX IF NOT EXISTS idx_tasks_user_created
    ON tasks(user_id, created_at_ms DESC, id DESC);

CREATE INDEX IF NOT EXISTS idx_tasks_user_status
    ON tasks(user_id, status, created_at_ms DESC);

CREATE INDEX IF NOT EXISTS idx_tasks_user_priority
    ON tasks(user_id, priority, created_at_ms DESC);

CREATE INDEX IF NOT EXISTS idx_tasks_user_due
    ON tasks(user_id, due_date_ms);

CREATE INDEX IF NOT EXISTS idx_task_comments_task_created
    ON task_comments(task_id, created_at_ms);

CREATE INDEX IF NOT EXISTS idx_task_comments_user_created
    ON task_comments(user_id, created_at_ms DESC);

CREATE INDEX IF NOT EXISTS idx_task_activity_task_created
    ON task_activity(task_id, created_at_ms);

CREATE INDEX IF NOT EXISTS idx_task_activity_user_created
    ON task_activity(user_id, created_at_ms DESC);
";

/// Migration v2: persisted rate-limit counters shared across processes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE TABLE IF NOT EXISTS rate_limit_counters (
    action TEXT NOT NULL,
    identity TEXT NOT NULL,
    value REAL NOT NULL,
    stamp_ms INTEGER NOT NULL,
    PRIMARY KEY (action, identity)
) WITHOUT ROWID;
";

/// Indexes expected by the listing, scan, and history query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_tasks_user_created",
    "idx_tasks_user_status",
    "idx_tasks_user_priority",
    "idx_tasks_user_due",
    "idx_task_comments_task_created",
    "idx_task_comments_user_created",
    "idx_task_activity_task_created",
    "idx_task_activity_user_created",
];
