//! Terminal prompts used while bootstrapping providers.

use std::io::{self, BufRead, Write};

use gt_core::Prompt;

/// Prompts on stderr and reads answers from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn secret(&mut self, question: &str) -> io::Result<String> {
        rpassword::prompt_password(format!("{question}: "))
    }

    fn text(&mut self, question: &str, default: Option<&str>) -> io::Result<String> {
        let mut stderr = io::stderr();
        match default {
            Some(d) if !d.is_empty() => write!(stderr, "{question} [{d}]: ")?,
            _ => write!(stderr, "{question}: ")?,
        }
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(answer.to_string())
    }
}
