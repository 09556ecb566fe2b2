//! Init command binding a repository to providers.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use gt_core::{Prompt, ProviderBinding};

use crate::{Config, InitArgs, RepoConfig, hooks, registry};

/// What `init` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Initialized,
    HooksInstalled,
    /// Result of `--check`.
    Checked(bool),
}

pub fn run<W: Write>(
    writer: &mut W,
    repo: &Path,
    config_path: Option<&Path>,
    args: &InitArgs,
    prompt: &mut dyn Prompt,
    exe: &Path,
) -> Result<InitStatus> {
    if args.check {
        let initialized = RepoConfig::is_initialized(repo);
        writeln!(
            writer,
            "{}",
            if initialized {
                "Repository is initialised."
            } else {
                "Repository is not initialised."
            }
        )?;
        return Ok(InitStatus::Checked(initialized));
    }

    if args.install_hook {
        hooks::install(repo, exe)?;
        writeln!(writer, "Installed git hooks.")?;
        return Ok(InitStatus::HooksInstalled);
    }

    if RepoConfig::is_initialized(repo) {
        bail!("repository {} is already initialised", repo.display());
    }

    let mut config = Config::load_from(config_path).context("failed to load configuration")?;
    let write_path = Config::write_path(config_path)?;
    let mut bindings = Vec::with_capacity(args.providers.len());
    for name in &args.providers {
        if registry::capabilities(name).is_none() {
            bail!(
                "unknown provider '{name}' (available: {})",
                registry::PROVIDERS.join(", ")
            );
        }
        if !config.providers.contains_key(name) {
            writeln!(writer, "Configuring provider '{name}'.")?;
            let fragment = registry::init(name, prompt)?;
            Config::save_provider(&write_path, name, &fragment)?;
            config.providers.insert(name.clone(), fragment);
        }
        bindings.push(ProviderBinding::named(name.as_str()));
    }

    // Fail before writing anything to the repository if a provider can't be built.
    registry::controller(&bindings, &config)?;

    let repo_config = RepoConfig {
        restart_on_commit: false,
        providers: bindings,
    };
    repo_config.save(repo)?;
    writeln!(writer, "Initialised {}.", repo.display())?;

    if !args.no_hook {
        hooks::install(repo, exe)?;
        writeln!(writer, "Installed git hooks.")?;
    }
    Ok(InitStatus::Initialized)
}
