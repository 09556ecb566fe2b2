//! Uninstall command.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::commands::util;
use crate::{RepoConfig, hooks};

/// Cancels the running session, then removes the hooks.
///
/// Hooks are removed even when cancelling fails. The binding is kept in that
/// case so `gitrack cancel` can be retried.
pub fn run<W: Write>(
    writer: &mut W,
    repo: &Path,
    config_path: Option<&Path>,
    purge: bool,
) -> Result<()> {
    let cancelled = if RepoConfig::is_initialized(repo) {
        util::open_session(repo, config_path).and_then(|(_repo_config, mut controller)| {
            controller.cancel_session()?;
            Ok(())
        })
    } else {
        tracing::debug!(repo = %repo.display(), "repository not bound, nothing to cancel");
        Ok(())
    };

    hooks::uninstall(repo)?;
    writeln!(writer, "Removed git hooks.")?;

    cancelled.context("hooks removed, but the running entry could not be cancelled")?;

    if purge {
        RepoConfig::remove(repo)?;
        writeln!(writer, "Removed repository binding.")?;
    }
    Ok(())
}
