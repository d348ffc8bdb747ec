//! `tl prefs`: per-user display settings.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tasklane_core::api::preferences::{self, UpdatePreferences};
use tasklane_core::model::{DefaultView, PreferencesId, Theme};

use super::Invocation;
use crate::output::{format_ms, pretty_kv, pretty_section, render};

#[derive(Args, Debug)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Show your preferences, creating defaults on first use.
    Show,

    /// Change one or more preferences.
    #[command(
        after_help = "EXAMPLES:\n    tl prefs set --theme dark --view board\n    tl prefs set --filter \"\"   # clears the default filter"
    )]
    Set(SetArgs),

    /// Create the default record if missing.
    Init,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// light | dark | system
    #[arg(long)]
    pub theme: Option<Theme>,

    /// list | board
    #[arg(long)]
    pub view: Option<DefaultView>,

    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub notifications: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrefsMutation {
    ok: bool,
    preferences_id: PreferencesId,
}

pub fn run_prefs(args: &PrefsArgs, inv: &Invocation<'_>) -> Result<()> {
    let backend = inv.backend()?;
    let identity = inv.identity();
    let ctx = backend.request(&identity);

    match &args.command {
        PrefsCommand::Show => {
            let prefs = inv.api(preferences::get_preferences(&ctx))?;
            render(inv.output, &prefs, |p, w| {
                pretty_section(w, &format!("Preferences for {}", p.user_id))?;
                pretty_kv(w, "theme", p.theme.as_str())?;
                pretty_kv(w, "view", p.default_view.as_str())?;
                pretty_kv(w, "filter", p.default_filter.as_deref().unwrap_or("-"))?;
                pretty_kv(w, "notifications", p.notifications_enabled.to_string())?;
                pretty_kv(w, "updated", format_ms(p.updated_at))
            })
        }
        PrefsCommand::Set(set) => {
            let input = UpdatePreferences {
                theme: set.theme,
                default_view: set.view,
                default_filter: set.filter.clone(),
                notifications_enabled: set.notifications,
            };
            let id = inv.api(preferences::update_preferences(&ctx, input))?;
            render_mutation(inv, id, "updated")
        }
        PrefsCommand::Init => {
            let id = inv.api(preferences::init_preferences(&ctx))?;
            render_mutation(inv, id, "ready")
        }
    }
}

fn render_mutation(inv: &Invocation<'_>, preferences_id: PreferencesId, verb: &str) -> Result<()> {
    let result = PrefsMutation {
        ok: true,
        preferences_id,
    };
    render(inv.output, &result, |_, w| writeln!(w, "✓ preferences {verb}"))
}
