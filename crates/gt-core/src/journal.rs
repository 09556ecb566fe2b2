//! Local file-backed provider.
//!
//! The running entry lives in `running.json`; finished entries are appended
//! to `entries.jsonl`. Both files sit in the directory named by the `path`
//! configuration key. Projects and tasks are not supported.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::{Capabilities, ProjectRef, TaskRef};
use crate::error::ProviderError;
use crate::provider::{
    Outcome, Prompt, Provider, ProviderConfig, ProviderFactory, RunningEntry, merge_tags,
};

const RUNNING_FILE: &str = "running.json";
const ENTRIES_FILE: &str = "entries.jsonl";

/// Entry that has been started but not stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningRecord {
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Entry finalized by a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedRecord {
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug)]
pub struct JournalProvider {
    dir: PathBuf,
    tags: Vec<String>,
}

impl JournalProvider {
    pub fn new(dir: impl Into<PathBuf>, tags: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            tags,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads all finalized entries, oldest first.
    pub fn entries(&self) -> Result<Vec<FinishedRecord>, ProviderError> {
        let path = self.dir.join(ENTRIES_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error("failed to read entries", e)),
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    self.io_error("failed to parse entries", io::Error::new(io::ErrorKind::InvalidData, e))
                })
            })
            .collect()
    }

    fn load_running(&self) -> Result<Option<RunningRecord>, ProviderError> {
        let path = self.dir.join(RUNNING_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
                self.io_error(
                    "failed to parse running entry",
                    io::Error::new(io::ErrorKind::InvalidData, e),
                )
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error("failed to read running entry", e)),
        }
    }

    fn save_running(&self, record: &RunningRecord) -> Result<(), ProviderError> {
        fs::create_dir_all(&self.dir).map_err(|e| self.io_error("failed to create journal directory", e))?;
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| self.io_error("failed to serialize running entry", e.into()))?;
        fs::write(self.dir.join(RUNNING_FILE), json)
            .map_err(|e| self.io_error("failed to write running entry", e))
    }

    fn clear_running(&self) -> Result<(), ProviderError> {
        match fs::remove_file(self.dir.join(RUNNING_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("failed to remove running entry", e)),
        }
    }

    fn append_entry(&self, record: &FinishedRecord) -> Result<(), ProviderError> {
        let line = serde_json::to_string(record)
            .map_err(|e| self.io_error("failed to serialize entry", e.into()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(ENTRIES_FILE))
            .map_err(|e| self.io_error("failed to open entries", e))?;
        writeln!(file, "{line}").map_err(|e| self.io_error("failed to append entry", e))
    }

    fn io_error(&self, context: &str, source: io::Error) -> ProviderError {
        ProviderError::io(Self::NAME, format!("{context} in {}", self.dir.display()), source)
    }
}

impl Provider for JournalProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Self::CAPABILITIES
    }

    fn current(&self) -> Result<Option<RunningEntry>, ProviderError> {
        Ok(self.load_running()?.map(|_| RunningEntry::default()))
    }

    fn start(
        &mut self,
        project: Option<&ProjectRef>,
        tags: &[String],
        force: bool,
    ) -> Result<Outcome, ProviderError> {
        self.check_project(project)?;
        let replaced = self.load_running()?.is_some();
        if replaced && !force {
            return Err(ProviderError::RunningEntry {
                provider: Self::NAME.to_string(),
                description: None,
            });
        }
        // A forced start silently replaces the running entry.
        self.save_running(&RunningRecord {
            started_at: Utc::now(),
            tags: merge_tags(&self.tags, tags),
        })?;
        Ok(if replaced {
            Outcome::Replaced
        } else {
            Outcome::Applied
        })
    }

    fn stop(
        &mut self,
        description: &str,
        task: Option<&TaskRef>,
        _force: bool,
    ) -> Result<Outcome, ProviderError> {
        self.check_task(task)?;
        let Some(running) = self.load_running()? else {
            return Ok(Outcome::NoEntry);
        };
        self.append_entry(&FinishedRecord {
            started_at: running.started_at,
            stopped_at: Utc::now(),
            description: description.to_string(),
            tags: running.tags,
        })?;
        self.clear_running()?;
        Ok(Outcome::Applied)
    }

    fn cancel(&mut self) -> Result<Outcome, ProviderError> {
        if self.load_running()?.is_none() {
            return Ok(Outcome::NoEntry);
        }
        self.clear_running()?;
        Ok(Outcome::Applied)
    }
}

impl ProviderFactory for JournalProvider {
    const NAME: &'static str = "journal";
    const CAPABILITIES: Capabilities = Capabilities::NONE;

    fn init(prompt: &mut dyn Prompt) -> Result<ProviderConfig, ProviderError> {
        let default_dir = dirs::data_dir()
            .map(|p| p.join("gitrack").join("journal"))
            .unwrap_or_else(|| PathBuf::from(".gitrack-journal"));
        let default_dir = default_dir.display().to_string();

        let path = prompt
            .text("Where should journal entries be stored?", Some(&default_dir))
            .map_err(|e| ProviderError::io(Self::NAME, "failed to read journal path", e))?;
        let tags = prompt
            .text("Should the entries be tagged? (tags delimited by ',')", Some(""))
            .map_err(|e| ProviderError::io(Self::NAME, "failed to read tags", e))?;

        let mut config = ProviderConfig::new();
        config.insert("path", path);
        if !tags.trim().is_empty() {
            config.insert("tags", tags);
        }
        Ok(config)
    }

    fn from_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        let dir = config.require(Self::NAME, "path")?;
        Ok(Self::new(dir, config.tags()))
    }
}
