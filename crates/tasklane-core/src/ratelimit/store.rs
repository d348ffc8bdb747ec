//! Counter stores: where limiter state lives between checks.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use super::policy::{CounterState, Decision, RateLimitAction};

/// Identifies one counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub action: RateLimitAction,
    pub identity: String,
}

impl CounterKey {
    #[must_use]
    pub fn new(action: RateLimitAction, identity: impl Into<String>) -> Self {
        Self {
            action,
            identity: identity.into(),
        }
    }
}

/// Transition applied to a counter: previous state in, new state and
/// decision out.
pub type Transition<'a> = &'a mut dyn FnMut(Option<CounterState>) -> (CounterState, Decision);

/// Storage for limiter counters.
///
/// `modify` must run the transition as one atomic read-modify-write for the
/// given key. Checks on different keys must not serialize on a shared lock.
pub trait CounterStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or written.
    fn modify(&self, key: &CounterKey, transition: Transition<'_>) -> Result<Decision>;
}

/// In-process store. Each key is updated under its DashMap shard lock.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<CounterKey, CounterState>,
}

impl MemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
        }
    }

    #[cfg(test)]
    fn get(&self, key: &CounterKey) -> Option<CounterState> {
        self.counters.get(key).map(|state| *state)
    }
}

impl CounterStore for MemoryCounterStore {
    fn modify(&self, key: &CounterKey, transition: Transition<'_>) -> Result<Decision> {
        match self.counters.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                let (next, decision) = transition(Some(*slot.get()));
                slot.insert(next);
                Ok(decision)
            }
            Entry::Vacant(slot) => {
                let (next, decision) = transition(None);
                slot.insert(next);
                Ok(decision)
            }
        }
    }
}

/// Store backed by the `rate_limit_counters` table, so separate processes
/// sharing one database file also share quota.
///
/// Every check opens its own connection and runs inside `BEGIN IMMEDIATE`,
/// which takes the write lock before the read.
#[derive(Debug, Clone)]
pub struct SqliteCounterStore {
    path: PathBuf,
}

impl SqliteCounterStore {
    /// The database at `path` must already carry the store schema.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .with_context(|| format!("open counter store {}", self.path.display()))?;
        crate::db::configure_connection(&conn).context("configure counter store pragmas")?;
        Ok(conn)
    }
}

impl CounterStore for SqliteCounterStore {
    fn modify(&self, key: &CounterKey, transition: Transition<'_>) -> Result<Decision> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("begin counter transaction")?;

        let previous = tx
            .query_row(
                "SELECT value, stamp_ms FROM rate_limit_counters
                 WHERE action = ?1 AND identity = ?2",
                params![key.action.as_str(), key.identity],
                |row| {
                    Ok(CounterState {
                        value: row.get(0)?,
                        stamp_ms: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("read counter")?;

        let (next, decision) = transition(previous);

        tx.execute(
            "INSERT INTO rate_limit_counters (action, identity, value, stamp_ms)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(action, identity) DO UPDATE
                SET value = excluded.value, stamp_ms = excluded.stamp_ms",
            params![key.action.as_str(), key.identity, next.value, next.stamp_ms],
        )
        .context("write counter")?;
        tx.commit().context("commit counter transaction")?;

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn bump(store: &dyn CounterStore, key: &CounterKey) -> Decision {
        store
            .modify(key, &mut |previous| {
                let value = previous.map_or(1.0, |s| s.value + 1.0);
                (CounterState { value, stamp_ms: 0 }, Decision::ALLOW)
            })
            .expect("modify counter")
    }

    #[test]
    fn memory_store_keeps_keys_apart() {
        let store = MemoryCounterStore::new();
        let ada = CounterKey::new(RateLimitAction::CreateTask, "ada");
        let grace = CounterKey::new(RateLimitAction::CreateTask, "grace");
        let ada_delete = CounterKey::new(RateLimitAction::DeleteTask, "ada");

        bump(&store, &ada);
        bump(&store, &ada);
        bump(&store, &grace);

        assert_eq!(store.get(&ada).map(|s| s.value), Some(2.0));
        assert_eq!(store.get(&grace).map(|s| s.value), Some(1.0));
        assert_eq!(store.get(&ada_delete), None);
    }

    #[test]
    fn memory_store_increments_are_atomic_per_key() {
        let store = Arc::new(MemoryCounterStore::new());
        let key = CounterKey::new(RateLimitAction::UpdateTask, "ada");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let key = key.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        bump(store.as_ref(), &key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread");
        }

        assert_eq!(store.get(&key).map(|s| s.value), Some(2_000.0));
    }

    #[test]
    fn sqlite_store_persists_between_connections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("counters.sqlite3");
        drop(crate::db::open_store(&path).expect("create store"));

        let key = CounterKey::new(RateLimitAction::CreateComment, "ada");
        let first = SqliteCounterStore::new(&path);
        bump(&first, &key);
        bump(&first, &key);

        let second = SqliteCounterStore::new(&path);
        let mut seen = None;
        second
            .modify(&key, &mut |previous| {
                seen = previous;
                (previous.unwrap_or(CounterState { value: 0.0, stamp_ms: 0 }), Decision::ALLOW)
            })
            .expect("modify counter");
        assert_eq!(seen.map(|s| s.value), Some(2.0));
    }
}
