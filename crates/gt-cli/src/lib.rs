//! gitrack CLI library.
//!
//! This crate provides the command-line interface: configuration, provider
//! registry, git hook scripts, and the subcommands driving sessions.

mod cli;
pub mod commands;
mod config;
pub mod hooks;
pub mod prompt;
pub mod registry;
pub mod repo;

pub use cli::{Cli, Commands, HookArgs, InitArgs, StartArgs, StopArgs};
pub use config::Config;
pub use repo::RepoConfig;
