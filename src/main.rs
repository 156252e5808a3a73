//! # Taskmaster
//!
//! A terminal task tracker that turns finished tasks into points, levels and
//! achievements. Use the CLI for quick entry and scripting, or the TUI for an
//! interactive dashboard.
//!
//! ## Usage
//!
//! ```bash
//! # Register and pick a user
//! taskmaster user add "Ada Lovelace" ada
//! export TASKMASTER_USER=ada
//!
//! # Schedule and complete tasks
//! taskmaster add "Write report" --date 2025-12-01 --time 09:00 --priority high
//! taskmaster complete 1
//!
//! # See how you're doing
//! taskmaster rewards
//! taskmaster analytics --days 7
//! taskmaster monthly 2025-12
//! ```
//!
//! Running without a subcommand opens the TUI.
//!
//! ## Scoring
//!
//! Every completion earns 5 points, +10 when finished at or before the
//! scheduled time, and +5 / +3 / +0 for high / medium / low priority. Levels
//! advance every 100 points.
//!
//! ## Configuration
//!
//! *   `TASKMASTER_DB` / `--db`: data file (default `~/.local/share/taskmaster/db.json`).
//! *   `TASKMASTER_USER` / `--user`: acting username.
//! *   `TASKMASTER_TZ` / `--tz`: `local` (default), `utc`, or `+HH:MM`; anchors
//!     scheduled times and day buckets.
//! *   `RUST_LOG` / `--verbose`: log filter (logs go to stderr).

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use taskmaster::commands::*;
use taskmaster::config::{Config, Zone};
use taskmaster::error::Result;
use taskmaster::export::ExportFormat;
use taskmaster::models::{parse_date, Priority};
use taskmaster::storage::TaskFilter;
use taskmaster::tui::run_tui;

#[derive(Parser)]
#[command(name = "taskmaster")]
#[command(about = "Task tracker with points, levels and achievements", long_about = None)]
struct Cli {
    /// Path to the data file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Acting username
    #[arg(short, long, global = true)]
    user: Option<String>,
    /// Time zone for schedules and day buckets (local, utc, +HH:MM)
    #[arg(long, global = true)]
    tz: Option<Zone>,
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Scheduled date in YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Scheduled time in HH:MM
        #[arg(short, long)]
        time: String,
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },
    /// List tasks, newest first
    List {
        /// Only tasks on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        completed: bool,
        /// Only pending tasks
        #[arg(long)]
        pending: bool,
        #[arg(short, long, value_enum)]
        priority: Option<Priority>,
    },
    /// List today's tasks
    Today,
    /// List the tasks of a month
    Month {
        /// Month in YYYY-MM
        month: String,
    },
    /// Edit a task
    Edit {
        id: u64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New date
        #[arg(short, long)]
        date: Option<String>,
        /// New time
        #[arg(short, long)]
        time: Option<String>,
        /// New priority
        #[arg(short, long, value_enum)]
        priority: Option<Priority>,
        /// Set completion state
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Mark a task as complete
    Complete {
        id: u64,
    },
    /// Mark a completed task as pending again
    Reopen {
        id: u64,
    },
    /// Remove a task
    Remove {
        id: u64,
    },
    /// Show points, level and badges
    Rewards,
    /// Show the achievement catalog
    Achievements,
    /// Show the top users by points
    Leaderboard,
    /// Summarize the last N days
    Analytics {
        /// Window size in days
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
    /// Summarize a month
    Monthly {
        /// Month in YYYY-MM
        month: String,
    },
    /// Show today's counts
    Stats,
    /// Export tasks
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user
    Add {
        /// Display name
        name: String,
        /// Unique username
        username: String,
    },
    /// List users
    List,
    /// Record the acting user's current streak
    Streak {
        value: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let cfg = Config::from_env().with_overrides(cli.db, cli.tz, cli.user);
    tracing::debug!(db = %cfg.db_path.display(), zone = %cfg.zone, "loaded configuration");

    match run(&cfg, cli.command, cli.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(code = e.code(), "command failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cfg: &Config, command: Option<Commands>, json: bool) -> Result<()> {
    match command {
        Some(Commands::Add { title, date, time, priority }) => cmd_add(cfg, title, date, time, priority, false).map(drop),
        Some(Commands::List { date, from, to, completed, pending, priority }) => {
            let filter = TaskFilter {
                date: date.as_deref().map(parse_date).transpose()?,
                from: from.as_deref().map(parse_date).transpose()?,
                to: to.as_deref().map(parse_date).transpose()?,
                completed: if completed { Some(true) } else if pending { Some(false) } else { None },
                priority,
            };
            cmd_list(cfg, filter, json)
        }
        Some(Commands::Today) => cmd_today(cfg, json),
        Some(Commands::Month { month }) => {
            let (year, month) = parse_month(&month)?;
            cmd_month(cfg, year, month, json)
        }
        Some(Commands::Edit { id, title, date, time, priority, completed }) => {
            cmd_edit(cfg, id, title, date, time, priority, completed, false).map(drop)
        }
        Some(Commands::Complete { id }) => cmd_complete(cfg, id, false).map(drop),
        Some(Commands::Reopen { id }) => cmd_reopen(cfg, id, false).map(drop),
        Some(Commands::Remove { id }) => cmd_remove(cfg, id, false),
        Some(Commands::Rewards) => cmd_rewards(cfg, json),
        Some(Commands::Achievements) => cmd_achievements(cfg, json),
        Some(Commands::Leaderboard) => cmd_leaderboard(cfg, json),
        Some(Commands::Analytics { days }) => cmd_analytics(cfg, days, json),
        Some(Commands::Monthly { month }) => {
            let (year, month) = parse_month(&month)?;
            cmd_monthly(cfg, year, month, json)
        }
        Some(Commands::Stats) => cmd_stats(cfg, json),
        Some(Commands::Export { format, from, to, output }) => cmd_export(cfg, format, from, to, output),
        Some(Commands::User { command }) => match command {
            UserCommands::Add { name, username } => cmd_user_add(cfg, name, username, false).map(drop),
            UserCommands::List => cmd_user_list(cfg, json),
            UserCommands::Streak { value } => cmd_user_streak(cfg, value, false).map(drop),
        },
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "taskmaster", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => run_tui(cfg),
    }
}
