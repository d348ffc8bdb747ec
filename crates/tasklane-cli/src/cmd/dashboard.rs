//! `tl dashboard`: read-only rollups of your tasks.

use anyhow::Result;
use clap::{Args, Subcommand};
use tasklane_core::api::dashboard;

use super::Invocation;
use super::activity::write_activity_row;
use super::task::{write_task_row, write_task_table};
use crate::output::{pretty_kv, pretty_section, render, render_mode};

#[derive(Args, Debug)]
pub struct DashboardArgs {
    #[command(subcommand)]
    pub command: Option<DashboardCommand>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum DashboardCommand {
    /// Counts by status plus overdue and upcoming (default).
    Summary,
    /// Newest tasks.
    Recent,
    /// Your latest activity across all tasks.
    Activity,
    /// Open tasks by priority.
    Priority,
    /// Completion rate and completions in the last week.
    Completion,
    /// Row counts per record kind.
    Overview,
}

pub fn run_dashboard(args: &DashboardArgs, inv: &Invocation<'_>) -> Result<()> {
    let backend = inv.backend()?;
    let identity = inv.identity();
    let ctx = backend.request(&identity);

    match args.command.unwrap_or(DashboardCommand::Summary) {
        DashboardCommand::Summary => {
            let summary = inv.api(dashboard::dashboard_summary(&ctx))?;
            render(inv.output, &summary, |s, w| {
                pretty_section(w, "Dashboard")?;
                pretty_kv(w, "total", s.total_tasks.to_string())?;
                pretty_kv(w, "pending", s.pending_tasks.to_string())?;
                pretty_kv(w, "in_progress", s.in_progress_tasks.to_string())?;
                pretty_kv(w, "completed", s.completed_tasks.to_string())?;
                pretty_kv(w, "overdue", s.overdue_tasks.to_string())?;
                pretty_kv(w, "upcoming", s.upcoming_tasks.to_string())
            })
        }
        DashboardCommand::Recent => {
            let tasks = inv.api(dashboard::recent_tasks(&ctx))?;
            render_mode(
                inv.output,
                &tasks,
                |items, w| items.iter().try_for_each(|t| write_task_row(w, t)),
                |items, w| write_task_table(w, items),
            )
        }
        DashboardCommand::Activity => {
            let entries = inv.api(dashboard::recent_activity(&ctx))?;
            render(inv.output, &entries, |items, w| {
                items.iter().try_for_each(|e| write_activity_row(w, e))
            })
        }
        DashboardCommand::Priority => {
            let counts = inv.api(dashboard::tasks_by_priority(&ctx))?;
            render(inv.output, &counts, |c, w| {
                pretty_kv(w, "high", c.high.to_string())?;
                pretty_kv(w, "medium", c.medium.to_string())?;
                pretty_kv(w, "low", c.low.to_string())
            })
        }
        DashboardCommand::Completion => {
            let stats = inv.api(dashboard::completion_stats(&ctx))?;
            render(inv.output, &stats, |s, w| {
                pretty_kv(w, "completed", format!("{}/{}", s.completed_tasks, s.total_tasks))?;
                pretty_kv(w, "rate", format!("{}%", s.completion_rate))?;
                pretty_kv(w, "last 7 days", s.recent_completions.to_string())
            })
        }
        DashboardCommand::Overview => {
            let overview = inv.api(dashboard::dashboard_overview(&ctx))?;
            render(inv.output, &overview, |o, w| {
                pretty_kv(w, "tasks", o.tasks.to_string())?;
                pretty_kv(w, "comments", o.comments.to_string())?;
                pretty_kv(w, "activity", o.activity.to_string())?;
                pretty_kv(w, "preferences", o.preferences.to_string())?;
                pretty_kv(w, "total", o.total_records.to_string())
            })
        }
    }
}
