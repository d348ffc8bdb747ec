//! `tl activity`: the audit trail of one task.

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use tasklane_core::api::tasks;
use tasklane_core::model::{TaskActivity, TaskId};

use super::Invocation;
use crate::output::{format_ms, render};

#[derive(Args, Debug)]
pub struct ActivityArgs {
    pub task: TaskId,
}

pub fn run_activity(args: &ActivityArgs, inv: &Invocation<'_>) -> Result<()> {
    let backend = inv.backend()?;
    let identity = inv.identity();
    let ctx = backend.request(&identity);

    let entries = inv.api(tasks::task_history(&ctx, args.task))?;
    render(inv.output, &entries, |items, w| {
        if items.is_empty() {
            return writeln!(w, "No activity.");
        }
        items.iter().try_for_each(|e| write_activity_row(w, e))
    })
}

pub(crate) fn write_activity_row(w: &mut dyn Write, entry: &TaskActivity) -> io::Result<()> {
    let metadata = entry
        .metadata
        .as_ref()
        .map_or_else(String::new, ToString::to_string);
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        format_ms(entry.created_at),
        entry.task_id,
        entry.action,
        metadata
    )
}
