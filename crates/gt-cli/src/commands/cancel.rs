//! Cancel command.

use std::io::Write;

use anyhow::Result;
use gt_core::SessionController;

pub fn run<W: Write>(writer: &mut W, controller: &mut SessionController) -> Result<()> {
    controller.cancel_session()?;
    writeln!(writer, "Time entry cancelled.")?;
    Ok(())
}
