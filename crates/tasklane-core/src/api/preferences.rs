//! Preference operations. Every user has at most one record, created on
//! first access.

use tracing::instrument;

use super::{Operation, RequestContext};
use crate::db;
use crate::error::ApiResult;
use crate::model::{DefaultView, PreferencesId, PreferencesPatch, Theme, UserPreferences};

/// Fields accepted by [`update_preferences`]; `None` leaves a field as is.
/// A blank `default_filter` clears the stored filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePreferences {
    pub theme: Option<Theme>,
    pub default_view: Option<DefaultView>,
    pub default_filter: Option<String>,
    pub notifications_enabled: Option<bool>,
}

/// The caller's preferences, created with defaults if absent.
///
/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn get_preferences(ctx: &RequestContext<'_>) -> ApiResult<UserPreferences> {
    let identity = ctx.begin(Operation::GetPreferences)?;
    let (prefs, created) =
        db::preferences::get_or_create(ctx.conn(), identity.as_str(), ctx.now_ms())?;
    if created {
        tracing::debug!(user = identity.as_str(), "default preferences created on read");
    }
    Ok(prefs)
}

/// # Errors
///
/// Fails with `Unauthenticated`, `RateLimited`, or `Store`.
#[instrument(level = "debug", skip(ctx, input), fields(op = "updatePreferences"))]
pub fn update_preferences(
    ctx: &RequestContext<'_>,
    input: UpdatePreferences,
) -> ApiResult<PreferencesId> {
    let identity = ctx.begin(Operation::UpdatePreferences)?;
    let now_ms = ctx.now_ms();
    let (existing, _) = db::preferences::get_or_create(ctx.conn(), identity.as_str(), now_ms)?;

    let patch = PreferencesPatch {
        theme: input.theme,
        default_view: input.default_view,
        default_filter: input.default_filter.map(|filter| {
            let filter = filter.trim();
            (!filter.is_empty()).then(|| filter.to_string())
        }),
        notifications_enabled: input.notifications_enabled,
    };
    db::preferences::patch(ctx.conn(), existing.id, &patch, now_ms)?;

    tracing::info!(user = identity.as_str(), "preferences updated");
    Ok(existing.id)
}

/// Create the default record, or return the existing one's id.
///
/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn init_preferences(ctx: &RequestContext<'_>) -> ApiResult<PreferencesId> {
    let identity = ctx.begin(Operation::InitPreferences)?;
    let (prefs, created) =
        db::preferences::get_or_create(ctx.conn(), identity.as_str(), ctx.now_ms())?;
    if created {
        tracing::info!(user = identity.as_str(), "preferences initialized");
    }
    Ok(prefs.id)
}
