#![forbid(unsafe_code)]

mod cmd;
mod identity;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tl: personal task tracking with an audit trail",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty | text | json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Act as this user (overrides TASKLANE_USER).
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create the task store in this directory",
        after_help = "EXAMPLES:\n    tl init\n    tl init --force --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Tasks", about = "Create, change, and list tasks")]
    Task(cmd::task::TaskArgs),

    #[command(next_help_heading = "Tasks", about = "Comment on tasks")]
    Comment(cmd::comment::CommentArgs),

    #[command(next_help_heading = "Tasks", about = "Show the audit trail of a task")]
    Activity(cmd::activity::ActivityArgs),

    #[command(next_help_heading = "Read", about = "Summaries across your tasks")]
    Dashboard(cmd::dashboard::DashboardArgs),

    #[command(next_help_heading = "Settings", about = "View or change your preferences")]
    Prefs(cmd::prefs::PrefsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TASKLANE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "tasklane=debug,info"
        } else {
            "tasklane=warn,warn"
        })
    });

    let format = env::var("TASKLANE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let inv = cmd::Invocation {
        project_root: &project_root,
        output: cli.output_mode(),
        user_flag: cli.user.as_deref(),
    };

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &inv),
        Commands::Task(args) => cmd::task::run_task(args, &inv),
        Commands::Comment(args) => cmd::comment::run_comment(args, &inv),
        Commands::Activity(args) => cmd::activity::run_activity(args, &inv),
        Commands::Dashboard(args) => cmd::dashboard::run_dashboard(args, &inv),
        Commands::Prefs(args) => cmd::prefs::run_prefs(args, &inv),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["tl", "task", "list", "--json", "--user", "ada"]);
        assert!(cli.json);
        assert_eq!(cli.user.as_deref(), Some("ada"));
        assert_eq!(cli.output_mode(), OutputMode::Json);
    }

    #[test]
    fn format_flag_selects_mode() {
        let cli = Cli::parse_from(["tl", "--format", "text", "dashboard"]);
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn list_filters_are_exclusive() {
        assert!(Cli::try_parse_from(["tl", "task", "list", "--overdue", "--upcoming"]).is_err());
        assert!(Cli::try_parse_from(["tl", "task", "list", "--status", "completed"]).is_ok());
        assert!(Cli::try_parse_from(["tl", "task", "list", "--status", "finished"]).is_err());
    }

    #[test]
    fn all_subcommands_parse() {
        let subcommands = [
            vec!["tl", "init"],
            vec!["tl", "task", "create", "Buy milk", "--priority", "high", "--due", "2030-01-01"],
            vec!["tl", "task", "show", "1"],
            vec!["tl", "task", "update", "1", "--status", "in_progress"],
            vec!["tl", "task", "done", "1"],
            vec!["tl", "task", "delete", "1"],
            vec!["tl", "task", "list", "--priority", "low"],
            vec!["tl", "task", "stats"],
            vec!["tl", "comment", "add", "1", "hello"],
            vec!["tl", "comment", "show", "1"],
            vec!["tl", "comment", "edit", "1", "bye"],
            vec!["tl", "comment", "rm", "1"],
            vec!["tl", "comment", "list", "1", "--recent", "2"],
            vec!["tl", "comment", "count", "1"],
            vec!["tl", "activity", "1"],
            vec!["tl", "dashboard"],
            vec!["tl", "dashboard", "completion"],
            vec!["tl", "prefs", "show"],
            vec!["tl", "prefs", "set", "--theme", "dark", "--notifications", "false"],
            vec!["tl", "prefs", "init"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn ids_must_be_numeric() {
        assert!(Cli::try_parse_from(["tl", "task", "show", "abc"]).is_err());
    }
}
