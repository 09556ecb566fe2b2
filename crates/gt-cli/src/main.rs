use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gt_cli::commands::init::InitStatus;
use gt_cli::commands::{cancel, hook, init, start, status, stop, uninstall, util};
use gt_cli::prompt::TerminalPrompt;
use gt_cli::{Cli, Commands, repo};

/// Absolute path of this binary, written into the hook scripts.
fn current_exe() -> Result<PathBuf> {
    std::env::current_exe().context("failed to locate the gitrack executable")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let repo_path = repo::discover(cli.repo.as_deref())?;
    let config_path = cli.config.as_deref();
    let mut stdout = io::stdout();

    match command {
        Commands::Init(args) => {
            let status = init::run(
                &mut stdout,
                &repo_path,
                config_path,
                args,
                &mut TerminalPrompt,
                &current_exe()?,
            )?;
            if status == InitStatus::Checked(false) {
                std::process::exit(2);
            }
        }
        Commands::Start(args) => {
            let (_repo_config, mut controller) = util::open_session(&repo_path, config_path)?;
            start::run(&mut stdout, &mut controller, args)?;
        }
        Commands::Stop(args) => {
            let (_repo_config, mut controller) = util::open_session(&repo_path, config_path)?;
            stop::run(&mut stdout, &mut controller, &repo_path, args)?;
        }
        Commands::Cancel => {
            let (_repo_config, mut controller) = util::open_session(&repo_path, config_path)?;
            cancel::run(&mut stdout, &mut controller)?;
        }
        Commands::Status => {
            let (repo_config, controller) = util::open_session(&repo_path, config_path)?;
            status::run(&mut stdout, &repo_path, &repo_config, &controller)?;
        }
        Commands::Hook(args) => {
            let (repo_config, mut controller) = util::open_session(&repo_path, config_path)?;
            hook::run(&mut stdout, &mut controller, &repo_path, &repo_config, args)?;
        }
        Commands::Uninstall { purge } => {
            uninstall::run(&mut stdout, &repo_path, config_path, *purge)?;
        }
    }

    Ok(())
}
