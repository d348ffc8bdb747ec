//! `tl task`: create, inspect, change, and list tasks.

use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tasklane_core::api::tasks::{self, CreateTask, UpdateTask};
use tasklane_core::model::{Task, TaskId, TaskPriority, TaskStatus};

use super::{Invocation, parse_due_date};
use crate::output::{
    format_ms, format_opt_ms, pretty_kv, pretty_rule, pretty_section, render, render_mode,
};

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    #[command(
        about = "Create a task",
        after_help = "EXAMPLES:\n    tl task create \"Buy milk\"\n    tl task create \"Ship release\" --priority high --due 2026-11-01"
    )]
    Create(CreateArgs),

    #[command(about = "Show one task")]
    Show(IdArg),

    #[command(
        about = "Change fields of a task",
        after_help = "EXAMPLES:\n    tl task update 3 --status in_progress\n    tl task update 3 --description \"\"   # clears the description"
    )]
    Update(UpdateArgs),

    #[command(about = "Mark a task completed")]
    Done(IdArg),

    #[command(about = "Delete a task and its activity")]
    Delete(IdArg),

    #[command(about = "List your tasks, newest first")]
    List(ListArgs),

    #[command(about = "Count your tasks by status")]
    Stats,
}

#[derive(Args, Debug)]
pub struct IdArg {
    pub id: TaskId,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    pub title: String,

    #[arg(long, short)]
    pub description: Option<String>,

    /// low | medium | high
    #[arg(long, short, default_value = "medium")]
    pub priority: TaskPriority,

    /// Epoch ms, RFC 3339, or YYYY-MM-DD.
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: TaskId,

    #[arg(long)]
    pub title: Option<String>,

    /// A blank value clears the description.
    #[arg(long)]
    pub description: Option<String>,

    /// pending | in_progress | completed
    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    /// Past due and not completed, soonest first.
    #[arg(long)]
    pub overdue: bool,

    /// Due within the next seven days and not completed.
    #[arg(long)]
    pub upcoming: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MutationOutput {
    ok: bool,
    task_id: TaskId,
}

pub fn run_task(args: &TaskArgs, inv: &Invocation<'_>) -> Result<()> {
    let backend = inv.backend()?;
    let identity = inv.identity();
    let ctx = backend.request(&identity);

    match &args.command {
        TaskCommand::Create(create) => {
            let due_date = create.due.as_deref().map(parse_due_date).transpose()?;
            let input = CreateTask {
                title: create.title.clone(),
                description: create.description.clone(),
                priority: create.priority,
                due_date,
            };
            let task_id = inv.api(tasks::create_task(&ctx, input))?;
            render_mutation(inv, task_id, "created")
        }
        TaskCommand::Show(IdArg { id }) => {
            let task = inv.api(tasks::get_task(&ctx, *id))?;
            render_mode(
                inv.output,
                &task,
                |t, w| write_task_row(w, t),
                |t, w| write_task_pretty(w, t),
            )
        }
        TaskCommand::Update(update) => {
            let due_date = update.due.as_deref().map(parse_due_date).transpose()?;
            let input = UpdateTask {
                title: update.title.clone(),
                description: update.description.clone(),
                status: update.status,
                priority: update.priority,
                due_date,
            };
            let task_id = inv.api(tasks::update_task(&ctx, update.id, input))?;
            render_mutation(inv, task_id, "updated")
        }
        TaskCommand::Done(IdArg { id }) => {
            let input = UpdateTask {
                status: Some(TaskStatus::Completed),
                ..UpdateTask::default()
            };
            let task_id = inv.api(tasks::update_task(&ctx, *id, input))?;
            render_mutation(inv, task_id, "completed")
        }
        TaskCommand::Delete(IdArg { id }) => {
            let task_id = inv.api(tasks::delete_task(&ctx, *id))?;
            render_mutation(inv, task_id, "deleted")
        }
        TaskCommand::List(list) => {
            let result = if let Some(status) = list.status {
                tasks::list_by_status(&ctx, status)
            } else if let Some(priority) = list.priority {
                tasks::list_by_priority(&ctx, priority)
            } else if list.overdue {
                tasks::list_overdue(&ctx)
            } else if list.upcoming {
                tasks::list_upcoming(&ctx)
            } else {
                tasks::list_tasks(&ctx)
            };
            let items = inv.api(result)?;
            render_mode(
                inv.output,
                &items,
                |items, w| items.iter().try_for_each(|t| write_task_row(w, t)),
                |items, w| write_task_table(w, items),
            )
        }
        TaskCommand::Stats => {
            let counts = inv.api(tasks::task_stats(&ctx))?;
            render(inv.output, &counts, |c, w| {
                pretty_kv(w, "total", c.total.to_string())?;
                pretty_kv(w, "pending", c.pending.to_string())?;
                pretty_kv(w, "in_progress", c.in_progress.to_string())?;
                pretty_kv(w, "completed", c.completed.to_string())
            })
        }
    }
}

fn render_mutation(inv: &Invocation<'_>, task_id: TaskId, verb: &str) -> Result<()> {
    let result = MutationOutput { ok: true, task_id };
    render(inv.output, &result, |r, w| writeln!(w, "✓ task {} {verb}", r.task_id))
}

pub(crate) fn write_task_row(w: &mut dyn Write, task: &Task) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}",
        task.id,
        task.status,
        task.priority,
        format_opt_ms(task.due_date),
        task.title
    )
}

pub(crate) fn write_task_table(w: &mut dyn Write, tasks: &[Task]) -> io::Result<()> {
    if tasks.is_empty() {
        return writeln!(w, "No tasks.");
    }
    writeln!(w, "{:>5}  {:<11}  {:<6}  TITLE", "ID", "STATUS", "PRIO")?;
    pretty_rule(w)?;
    for task in tasks {
        writeln!(
            w,
            "{:>5}  {:<11}  {:<6}  {}",
            task.id.get(),
            task.status.as_str(),
            task.priority.as_str(),
            task.title
        )?;
    }
    Ok(())
}

fn write_task_pretty(w: &mut dyn Write, task: &Task) -> io::Result<()> {
    pretty_section(w, &format!("Task {}: {}", task.id, task.title))?;
    pretty_kv(w, "status", task.status.as_str())?;
    pretty_kv(w, "priority", task.priority.as_str())?;
    if let Some(description) = &task.description {
        pretty_kv(w, "description", description)?;
    }
    pretty_kv(w, "due", format_opt_ms(task.due_date))?;
    if let Some(completed_at) = task.completed_at {
        pretty_kv(w, "completed", format_ms(completed_at))?;
    }
    pretty_kv(w, "created", format_ms(task.created_at))?;
    pretty_kv(w, "updated", format_ms(task.updated_at))
}
