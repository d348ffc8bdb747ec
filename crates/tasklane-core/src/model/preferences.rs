use serde::{Deserialize, Serialize};

use super::{row_id, text_enum};

row_id!(
    /// Primary key of a row in `user_preferences`.
    PreferencesId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

text_enum!(Theme, "theme");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultView {
    #[default]
    List,
    Board,
}

impl DefaultView {
    pub const ALL: [Self; 2] = [Self::List, Self::Board];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Board => "board",
        }
    }
}

text_enum!(DefaultView, "default view");

/// Per-user settings; at most one row per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub id: PreferencesId,
    pub user_id: String,
    pub theme: Theme,
    pub default_view: DefaultView,
    pub default_filter: Option<String>,
    pub notifications_enabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPreferences {
    pub user_id: String,
    pub theme: Theme,
    pub default_view: DefaultView,
    pub default_filter: Option<String>,
    pub notifications_enabled: bool,
}

impl NewPreferences {
    /// The record created on first access: system theme, list view,
    /// notifications on.
    #[must_use]
    pub fn defaults_for(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            theme: Theme::default(),
            default_view: DefaultView::default(),
            default_filter: None,
            notifications_enabled: true,
        }
    }
}

/// `default_filter: Some(None)` clears the stored filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesPatch {
    pub theme: Option<Theme>,
    pub default_view: Option<DefaultView>,
    pub default_filter: Option<Option<String>>,
    pub notifications_enabled: Option<bool>,
}
