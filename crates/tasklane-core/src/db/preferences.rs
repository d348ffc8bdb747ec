//! Per-user preference rows, unique on `user_id`.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::ToSql};

use crate::model::{NewPreferences, PreferencesId, PreferencesPatch, UserPreferences};

const PREFERENCE_COLUMNS: &str = "id, user_id, theme, default_view, default_filter, \
     notifications_enabled, created_at_ms, updated_at_ms";

fn row_to_preferences(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserPreferences> {
    Ok(UserPreferences {
        id: row.get(0)?,
        user_id: row.get(1)?,
        theme: row.get(2)?,
        default_view: row.get(3)?,
        default_filter: row.get(4)?,
        notifications_enabled: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get_by_user(conn: &Connection, user_id: &str) -> Result<Option<UserPreferences>> {
    conn.query_row(
        &format!("SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = ?1"),
        [user_id],
        row_to_preferences,
    )
    .optional()
    .with_context(|| format!("get preferences for {user_id}"))
}

/// Return the user's row, creating it with defaults if absent.
///
/// The second element is `true` when this call created the row. Concurrent
/// callers for the same user converge on a single row through the unique
/// index.
///
/// # Errors
///
/// Returns an error if the insert or lookup fails.
pub fn get_or_create(
    conn: &Connection,
    user_id: &str,
    now_ms: i64,
) -> Result<(UserPreferences, bool)> {
    let defaults = NewPreferences::defaults_for(user_id);
    let created = conn
        .execute(
            "INSERT OR IGNORE INTO user_preferences
                (user_id, theme, default_view, default_filter,
                 notifications_enabled, created_at_ms, updated_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                defaults.user_id,
                defaults.theme,
                defaults.default_view,
                defaults.default_filter,
                defaults.notifications_enabled,
                now_ms,
            ],
        )
        .with_context(|| format!("create default preferences for {user_id}"))?
        > 0;

    let prefs = get_by_user(conn, user_id)?
        .ok_or_else(|| anyhow!("preferences for {user_id} missing after insert"))?;
    Ok((prefs, created))
}

/// Merge `patch` into the row and refresh `updated_at_ms`.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn patch(
    conn: &Connection,
    id: PreferencesId,
    patch: &PreferencesPatch,
    now_ms: i64,
) -> Result<bool> {
    let mut assignments = vec!["updated_at_ms = ?1".to_string()];
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(now_ms)];

    let mut set = |column: &str, value: Box<dyn ToSql>| {
        values.push(value);
        assignments.push(format!("{column} = ?{}", values.len()));
    };
    if let Some(theme) = patch.theme {
        set("theme", Box::new(theme));
    }
    if let Some(view) = patch.default_view {
        set("default_view", Box::new(view));
    }
    if let Some(filter) = &patch.default_filter {
        set("default_filter", Box::new(filter.clone()));
    }
    if let Some(enabled) = patch.notifications_enabled {
        set("notifications_enabled", Box::new(enabled));
    }

    values.push(Box::new(id));
    let sql = format!(
        "UPDATE user_preferences SET {} WHERE id = ?{}",
        assignments.join(", "),
        values.len()
    );
    let changed = conn
        .execute(&sql, params_from_iter(values.iter().map(AsRef::as_ref)))
        .with_context(|| format!("patch preferences {id}"))?;
    Ok(changed > 0)
}
