//! Shared utilities for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use gt_core::SessionController;

use crate::{Config, RepoConfig, registry};

/// Loads the repository binding and constructs every bound provider.
pub fn open_session(repo: &Path, config_path: Option<&Path>) -> Result<(RepoConfig, SessionController)> {
    let repo_config = RepoConfig::load(repo)?;
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, ?repo_config, "loaded configuration");

    let controller = registry::controller(&repo_config.providers, &config)?;
    Ok((repo_config, controller))
}
