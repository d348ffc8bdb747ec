//! `tl init`: create `.tasklane/` with a config template and an empty store.

use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use tasklane_core::config::{CONFIG_FILE, TASKLANE_DIR};
use tasklane_core::db;

use super::Invocation;
use crate::output::render;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file with the default template.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[store]\n\
    path = \".tasklane/tasklane.sqlite3\"\n\
    \n\
    [rate_limit]\n\
    enabled = true\n\
    \n\
    [dashboard]\n\
    recent_tasks = 10\n\
    recent_activity = 20\n";

const GITIGNORE: &str = "*.sqlite3\n*.sqlite3-wal\n*.sqlite3-shm\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    store: String,
    schema_version: u32,
    config_written: bool,
}

/// # Errors
///
/// Returns an error if any filesystem operation fails or the store cannot be
/// created.
pub fn run_init(args: &InitArgs, inv: &Invocation<'_>) -> Result<()> {
    let dir = inv.project_root.join(TASKLANE_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let config_path = dir.join(CONFIG_FILE);
    let config_written = args.force || !config_path.exists();
    if config_written {
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        std::fs::write(dir.join(".gitignore"), GITIGNORE)
            .with_context(|| format!("Failed to write .gitignore in {}", dir.display()))?;
    }

    let config = inv.config()?;
    let store_path = config.store_path(inv.project_root);
    let conn = db::open_store(&store_path)?;
    let schema_version = db::migrations::current_schema_version(&conn)?;
    tracing::info!(store = %store_path.display(), schema_version, "store ready");

    let result = InitOutput {
        ok: true,
        store: store_path.display().to_string(),
        schema_version,
        config_written,
    };
    render(inv.output, &result, |r, w| {
        writeln!(w, "✓ task store ready at {} (schema v{})", r.store, r.schema_version)
    })
}
