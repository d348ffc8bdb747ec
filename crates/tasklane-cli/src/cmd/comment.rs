//! `tl comment`: notes on your own tasks.

use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tasklane_core::api::comments;
use tasklane_core::model::{CommentId, TaskComment, TaskId};

use super::Invocation;
use crate::output::{format_ms, render, render_mode};

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    #[command(
        about = "Add a comment to a task",
        after_help = "EXAMPLES:\n    tl comment add 3 \"Checked the corner shop\""
    )]
    Add { task: TaskId, content: String },

    #[command(about = "Show one comment")]
    Show { id: CommentId },

    #[command(about = "Replace a comment's text")]
    Edit { id: CommentId, content: String },

    #[command(about = "Remove a comment")]
    Rm { id: CommentId },

    #[command(
        about = "List comments on a task",
        after_help = "EXAMPLES:\n    tl comment list 3\n    tl comment list 3 --recent 2"
    )]
    List {
        task: TaskId,

        /// Newest N comments instead of the full thread.
        #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "5")]
        recent: Option<usize>,
    },

    #[command(about = "Count comments on a task")]
    Count { task: TaskId },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentMutation {
    ok: bool,
    comment_id: CommentId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentCount {
    task_id: TaskId,
    count: u64,
}

pub fn run_comment(args: &CommentArgs, inv: &Invocation<'_>) -> Result<()> {
    let backend = inv.backend()?;
    let identity = inv.identity();
    let ctx = backend.request(&identity);

    match &args.command {
        CommentCommand::Add { task, content } => {
            let comment_id = inv.api(comments::create_comment(&ctx, *task, content))?;
            render_mutation(inv, comment_id, "added")
        }
        CommentCommand::Show { id } => {
            let comment = inv.api(comments::get_comment(&ctx, *id))?;
            render(inv.output, &comment, |c, w| write_comment(w, c))
        }
        CommentCommand::Edit { id, content } => {
            let comment_id = inv.api(comments::update_comment(&ctx, *id, content))?;
            render_mutation(inv, comment_id, "updated")
        }
        CommentCommand::Rm { id } => {
            let comment_id = inv.api(comments::delete_comment(&ctx, *id))?;
            render_mutation(inv, comment_id, "removed")
        }
        CommentCommand::List { task, recent } => {
            let result = match recent {
                Some(limit) => comments::list_recent_comments(&ctx, *task, Some(*limit)),
                None => comments::list_comments_by_task(&ctx, *task),
            };
            let items = inv.api(result)?;
            render_mode(
                inv.output,
                &items,
                |items, w| items.iter().try_for_each(|c| write_comment(w, c)),
                |items, w| {
                    if items.is_empty() {
                        return writeln!(w, "No comments.");
                    }
                    for comment in items {
                        writeln!(w, "#{} at {}", comment.id, format_ms(comment.created_at))?;
                        writeln!(w, "  {}", comment.content)?;
                    }
                    Ok(())
                },
            )
        }
        CommentCommand::Count { task } => {
            let count = inv.api(comments::get_comment_count(&ctx, *task))?;
            let result = CommentCount {
                task_id: *task,
                count,
            };
            render(inv.output, &result, |r, w| writeln!(w, "{}", r.count))
        }
    }
}

fn render_mutation(inv: &Invocation<'_>, comment_id: CommentId, verb: &str) -> Result<()> {
    let result = CommentMutation {
        ok: true,
        comment_id,
    };
    render(inv.output, &result, |r, w| {
        writeln!(w, "✓ comment {} {verb}", r.comment_id)
    })
}

fn write_comment(w: &mut dyn Write, comment: &TaskComment) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        comment.id,
        comment.task_id,
        format_ms(comment.created_at),
        comment.content
    )
}
