//! Hook command invoked by the installed git hook scripts.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use gt_core::hook::{self, HookKind};
use gt_core::{HookEvent, HookOutcome, SessionController};

use crate::{HookArgs, RepoConfig, repo};

pub fn run<W: Write>(
    writer: &mut W,
    controller: &mut SessionController,
    repo_path: &Path,
    repo_config: &RepoConfig,
    args: &HookArgs,
) -> Result<HookOutcome> {
    let kind: HookKind = args.event.parse()?;
    let message = match (kind, &args.message) {
        (HookKind::PostCommit, None) => Some(
            repo::last_commit_message(repo_path).context("failed to read the commit message")?,
        ),
        (_, message) => message.clone(),
    };

    let event = HookEvent::new(kind, message.as_deref());
    let outcome = hook::dispatch(controller, &event, &repo_config.policy())?;
    tracing::info!(hook = %kind, %outcome, "hook handled");
    writeln!(writer, "gitrack: {kind} {outcome}")?;
    Ok(outcome)
}
