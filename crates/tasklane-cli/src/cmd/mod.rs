pub mod activity;
pub mod comment;
pub mod dashboard;
pub mod init;
pub mod prefs;
pub mod task;

use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate};
use tasklane_core::config::{self, ProjectConfig};
use tasklane_core::error::ErrorCode;
use tasklane_core::{ApiResult, Backend};

use crate::identity::CliIdentity;
use crate::output::{CliError, OutputMode, render_error};

/// Everything a command handler needs besides its own arguments.
pub struct Invocation<'a> {
    pub project_root: &'a Path,
    pub output: OutputMode,
    pub user_flag: Option<&'a str>,
}

impl Invocation<'_> {
    pub fn identity(&self) -> CliIdentity {
        CliIdentity::resolve(self.user_flag)
    }

    pub fn config(&self) -> anyhow::Result<ProjectConfig> {
        config::load_project_config(self.project_root).or_else(|err| {
            let msg = format!("{err:#}");
            render_error(self.output, &CliError::coded(&msg, ErrorCode::ConfigParseError))?;
            anyhow::bail!(msg)
        })
    }

    /// Open the project's store. Fails when `tl init` has not been run.
    pub fn backend(&self) -> anyhow::Result<Backend> {
        let config = self.config()?;
        let msg = match Backend::open_existing(self.project_root, &config) {
            Ok(Some(backend)) => return Ok(backend),
            Ok(None) => format!(
                "no task store at {}",
                config.store_path(self.project_root).display()
            ),
            Err(err) => format!("{err:#}"),
        };
        render_error(self.output, &CliError::coded(&msg, ErrorCode::StoreUnavailable))?;
        anyhow::bail!(msg)
    }

    /// Surface an operation failure on stderr and turn it into an exit error.
    pub fn api<T>(&self, result: ApiResult<T>) -> anyhow::Result<T> {
        result.or_else(|err| {
            tracing::debug!(code = err.code().code(), "request failed: {err}");
            render_error(self.output, &CliError::from(&err))?;
            Err(anyhow::Error::new(err))
        })
    }
}

/// Accept epoch milliseconds, RFC 3339, or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_due_date(raw: &str) -> anyhow::Result<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.timestamp_millis());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| {
        format!("invalid due date '{raw}': expected ms, RFC 3339, or YYYY-MM-DD")
    })?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .context("invalid due date")
}
