//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Track working time against git commits.
///
/// Starts and stops time entries in the configured providers as git hooks
/// fire around each commit.
#[derive(Debug, Parser)]
#[command(name = "gitrack", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository to operate on (defaults to the current directory).
    #[arg(short, long, global = true)]
    pub repo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bind the repository to providers and install git hooks.
    Init(InitArgs),

    /// Start a time entry in every provider.
    Start(StartArgs),

    /// Stop the running time entries.
    Stop(StopArgs),

    /// Discard the running time entries.
    Cancel,

    /// Show whether entries are running.
    Status,

    /// Handle a git hook event.
    Hook(HookArgs),

    /// Cancel any running entry and remove the git hooks.
    Uninstall {
        /// Also remove the repository binding.
        #[arg(long)]
        purge: bool,
    },
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Providers to bind, in order.
    #[arg(short, long = "provider", default_value = "toggl")]
    pub providers: Vec<String>,

    /// Do not install git hooks.
    #[arg(long, conflicts_with = "install_hook")]
    pub no_hook: bool,

    /// Only install git hooks.
    #[arg(long)]
    pub install_hook: bool,

    /// Exit with status 2 if the repository is not initialised.
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Project id or name.
    #[arg(short, long)]
    pub project: Option<String>,

    /// Replace a running entry.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct StopArgs {
    /// Entry description (defaults to the last commit message).
    #[arg(short, long)]
    pub message: Option<String>,

    /// Task id or name.
    #[arg(short, long)]
    pub task: Option<String>,

    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct HookArgs {
    /// Hook event: pre-commit, post-commit or abort.
    pub event: String,

    /// Commit message (defaults to the last commit message).
    #[arg(short, long)]
    pub message: Option<String>,
}
