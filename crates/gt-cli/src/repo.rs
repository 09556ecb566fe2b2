//! Repository binding stored in `<repo>/.gitrack`.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Format, Toml};
use gt_core::{HookPolicy, ProviderBinding};
use serde::{Deserialize, Serialize};

pub const BINDING_FILE: &str = ".gitrack";

/// Providers and settings bound to one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Follow each post-commit stop with a fresh start.
    #[serde(default)]
    pub restart_on_commit: bool,
    /// Providers in the order they are driven.
    #[serde(default)]
    pub providers: Vec<ProviderBinding>,
}

impl RepoConfig {
    pub fn path(repo: &Path) -> PathBuf {
        repo.join(BINDING_FILE)
    }

    pub fn is_initialized(repo: &Path) -> bool {
        Self::path(repo).is_file()
    }

    pub fn load(repo: &Path) -> Result<Self> {
        let path = Self::path(repo);
        if !path.is_file() {
            bail!(
                "repository {} is not initialised. Run 'gitrack init' first.",
                repo.display()
            );
        }
        Figment::new()
            .merge(Toml::file(&path))
            .extract()
            .with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn save(&self, repo: &Path) -> Result<()> {
        let path = Self::path(repo);
        let content = toml::to_string_pretty(self).context("failed to serialize binding")?;
        std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn remove(repo: &Path) -> Result<()> {
        match std::fs::remove_file(Self::path(repo)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("failed to remove repository binding"),
        }
    }

    /// Hook policy for this repository; project and task come from bindings.
    pub fn policy(&self) -> HookPolicy {
        HookPolicy {
            restart_on_commit: self.restart_on_commit,
            ..HookPolicy::default()
        }
    }
}

/// Resolves the top-level directory of the git repository containing `start`.
pub fn discover(start: Option<&Path>) -> Result<PathBuf> {
    let start = match start {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let output = Command::new("git")
        .arg("-C")
        .arg(&start)
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .context("failed to run git")?;
    if !output.status.success() {
        bail!("{} is not inside a git repository", start.display());
    }
    let root = String::from_utf8(output.stdout).context("git returned a non-UTF-8 path")?;
    Ok(PathBuf::from(root.trim()))
}

/// Directory git runs hooks from for `repo`.
///
/// Honours `core.hooksPath` and linked worktrees, where `.git` is a file.
pub fn hooks_dir(repo: &Path) -> Result<PathBuf> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["rev-parse", "--git-path", "hooks"])
        .output()
        .context("failed to run git")?;
    if !output.status.success() {
        bail!(
            "failed to locate hooks directory: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let dir = String::from_utf8(output.stdout).context("git returned a non-UTF-8 path")?;
    // Relative answers are relative to the directory passed with -C.
    Ok(repo.join(dir.trim()))
}

/// Full message of the last commit.
pub fn last_commit_message(repo: &Path) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["log", "-1", "--pretty=%B"])
        .output()
        .context("failed to run git log")?;
    if !output.status.success() {
        bail!(
            "git log failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Creates an empty git repository at `dir`.
#[cfg(test)]
pub(crate) fn git_init(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["init", "--quiet"])
        .status()
        .expect("failed to run git init");
    assert!(status.success(), "git init failed in {}", dir.display());
}
