//! Configuration loading and management.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use gt_core::ProviderConfig;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Settings per provider name, e.g. `[providers.toggl]`.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("providers", &self.providers)
            .finish()
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (GITRACK_PROVIDERS__TOGGL__API_TOKEN)
        figment = figment.merge(Env::prefixed("GITRACK_").split("__"));

        figment.extract()
    }

    /// File that `init` writes provider settings to.
    pub fn write_path(config_path: Option<&Path>) -> anyhow::Result<PathBuf> {
        if let Some(path) = config_path {
            return Ok(path.to_path_buf());
        }
        let dir = dirs_config_path().context("could not determine config directory")?;
        Ok(dir.join("config.toml"))
    }

    /// Stores one provider's settings in the config file at `path`.
    ///
    /// Other providers already in the file are kept.
    pub fn save_provider(path: &Path, name: &str, fragment: &ProviderConfig) -> anyhow::Result<()> {
        let mut on_disk: Self = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        on_disk.providers.insert(name.to_string(), fragment.clone());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("failed to create config directory")?;
        }
        let content = toml::to_string_pretty(&on_disk).context("failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Returns the platform-specific config directory for gitrack.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("gitrack"))
}
