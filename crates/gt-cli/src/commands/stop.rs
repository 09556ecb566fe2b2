//! Stop command.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use gt_core::hook::commit_summary;
use gt_core::{EntityRef, SessionController};

use crate::StopArgs;
use crate::repo;

pub fn run<W: Write>(
    writer: &mut W,
    controller: &mut SessionController,
    repo_path: &Path,
    args: &StopArgs,
) -> Result<()> {
    if !controller.is_any_session_running()? {
        writeln!(writer, "No time entry is running.")?;
        return Ok(());
    }

    let message = match &args.message {
        Some(message) => message.clone(),
        None => repo::last_commit_message(repo_path)?,
    };
    let task = args.task.as_deref().map(EntityRef::from);
    controller.stop_session(commit_summary(&message), task.as_ref(), args.force)?;
    writeln!(writer, "Time entry stopped.")?;
    Ok(())
}
