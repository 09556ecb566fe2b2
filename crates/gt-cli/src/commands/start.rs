//! Start command.

use std::io::Write;

use anyhow::Result;
use gt_core::{EntityRef, SessionController};

use crate::StartArgs;

pub fn run<W: Write>(writer: &mut W, controller: &mut SessionController, args: &StartArgs) -> Result<()> {
    let project = args.project.as_deref().map(EntityRef::from);
    controller.start_session(project.as_ref(), args.force)?;
    writeln!(writer, "Time entry started.")?;
    Ok(())
}
