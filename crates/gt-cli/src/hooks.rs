//! Git hook scripts calling back into gitrack.
//!
//! Each installed hook gets one line tagged with [`MARKER`]; any existing
//! hook content is preserved.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gt_core::HookKind;

use crate::repo;

pub const MARKER: &str = "# gitrack";
const SHEBANG: &str = "#!/bin/sh";

fn hook_file(dir: &Path, kind: HookKind) -> PathBuf {
    dir.join(kind.to_string())
}

pub fn hook_path(repo: &Path, kind: HookKind) -> Result<PathBuf> {
    Ok(hook_file(&repo::hooks_dir(repo)?, kind))
}

fn hook_line(exe: &Path, kind: HookKind) -> String {
    let exe = exe.display().to_string().replace('\'', r"'\''");
    format!("'{exe}' hook {kind} {MARKER}")
}

/// Whether every git hook carries the gitrack line.
pub fn is_installed(repo: &Path) -> Result<bool> {
    let dir = repo::hooks_dir(repo)?;
    Ok(HookKind::GIT.iter().all(|kind| {
        fs::read_to_string(hook_file(&dir, *kind)).is_ok_and(|content| content.contains(MARKER))
    }))
}

/// Adds the gitrack line to the pre-commit and post-commit hooks.
pub fn install(repo: &Path, exe: &Path) -> Result<()> {
    let dir = repo::hooks_dir(repo)?;
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    for kind in HookKind::GIT {
        let path = hook_file(&dir, kind);
        let line = hook_line(exe, kind);
        let content = match fs::read_to_string(&path) {
            Ok(existing) if existing.contains(MARKER) => continue,
            Ok(existing) => format!("{}\n{line}\n", existing.trim_end()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => format!("{SHEBANG}\n{line}\n"),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
        make_executable(&path)?;
        tracing::debug!(hook = %kind, path = %path.display(), "installed hook");
    }
    Ok(())
}

/// Removes the gitrack lines, deleting hooks left with nothing else.
pub fn uninstall(repo: &Path) -> Result<()> {
    let dir = repo::hooks_dir(repo)?;
    for kind in HookKind::GIT {
        let path = hook_file(&dir, kind);
        let existing = match fs::read_to_string(&path) {
            Ok(existing) => existing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        let kept: Vec<&str> = existing.lines().filter(|l| !l.contains(MARKER)).collect();
        let empty = kept
            .iter()
            .all(|l| l.trim().is_empty() || l.trim() == SHEBANG);
        if empty {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        } else {
            fs::write(&path, format!("{}\n", kept.join("\n")))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        tracing::debug!(hook = %kind, "removed hook");
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms).context("failed to mark hook executable")
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
