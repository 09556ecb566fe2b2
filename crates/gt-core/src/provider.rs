//! The contract every time-tracking backend implements.
//!
//! Providers are constructed once per command invocation from persisted
//! configuration and never cache entry state: "is an entry running" is always
//! a fresh query against the backend.

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use serde::{Deserialize, Deserializer, Serialize};

use crate::capability::{Capabilities, Capability, ProjectRef, TaskRef};
use crate::error::ProviderError;

/// The entry currently active on a backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunningEntry {
    pub description: Option<String>,
}

/// What a lifecycle call actually did on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The transition was applied.
    Applied,
    /// A forced start replaced a running entry.
    Replaced,
    /// Nothing was running, so stop/cancel did nothing.
    NoEntry,
}

/// A time-tracking backend driven through start/stop/cancel.
pub trait Provider {
    /// Unique provider name, e.g. `toggl`.
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Queries the backend for the active entry.
    ///
    /// Must fail rather than report `None` when the backend cannot be asked.
    fn current(&self) -> Result<Option<RunningEntry>, ProviderError>;

    fn is_running(&self) -> Result<bool, ProviderError> {
        Ok(self.current()?.is_some())
    }

    /// Fails with [`ProviderError::UnsupportedCapability`] for a project
    /// this provider cannot record.
    fn check_project(&self, project: Option<&ProjectRef>) -> Result<(), ProviderError> {
        self.capabilities()
            .check(self.name(), Capability::Projects, project)
    }

    /// Same as [`Provider::check_project`], for tasks.
    fn check_task(&self, task: Option<&TaskRef>) -> Result<(), ProviderError> {
        self.capabilities().check(self.name(), Capability::Tasks, task)
    }

    /// Begins a new entry.
    ///
    /// Implementations call [`Provider::check_project`] before touching the
    /// backend.
    ///
    /// Fails with [`ProviderError::RunningEntry`] if an entry is active and
    /// `force` is false. With `force`, afterwards exactly one entry is active
    /// and it is the new one.
    fn start(
        &mut self,
        project: Option<&ProjectRef>,
        tags: &[String],
        force: bool,
    ) -> Result<Outcome, ProviderError>;

    /// Sets the description (and task) of the active entry and finalizes it.
    ///
    /// Returns [`Outcome::NoEntry`] when nothing is running.
    fn stop(
        &mut self,
        description: &str,
        task: Option<&TaskRef>,
        force: bool,
    ) -> Result<Outcome, ProviderError>;

    /// Discards the active entry without keeping a record.
    fn cancel(&mut self) -> Result<Outcome, ProviderError>;
}

impl fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("capabilities", &self.capabilities())
            .finish_non_exhaustive()
    }
}

/// Operator interaction used while bootstrapping provider configuration.
pub trait Prompt {
    /// Asks for a value without echoing it.
    fn secret(&mut self, question: &str) -> io::Result<String>;

    /// Asks for a free-form value; an empty answer yields `default`.
    fn text(&mut self, question: &str, default: Option<&str>) -> io::Result<String>;
}

/// Construction side of a provider type.
pub trait ProviderFactory: Provider + Sized {
    const NAME: &'static str;
    const CAPABILITIES: Capabilities;

    /// Collects credentials and options for this provider type.
    ///
    /// The returned fragment is persisted by the caller.
    fn init(prompt: &mut dyn Prompt) -> Result<ProviderConfig, ProviderError>;

    /// Builds the provider from persisted configuration.
    ///
    /// Missing required keys fail with [`ProviderError::Config`].
    fn from_config(config: ProviderConfig) -> Result<Self, ProviderError>;
}

/// String settings of one provider, e.g. `api_token` or `tags`.
///
/// Numbers, booleans and lists are accepted when reading and stored in
/// their string form; lists are joined with `,`.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProviderConfig(BTreeMap<String, String>);

/// A configuration value as written in TOML or taken from the environment.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    List(Vec<RawValue>),
}

impl RawValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Bool(b) => b.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::List(items) => items
                .into_iter()
                .map(Self::into_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl<'de> Deserialize<'de> for ProviderConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, RawValue>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(key, value)| (key, value.into_string()))
                .collect(),
        ))
    }
}

/// Keys whose values are never printed.
const SECRET_KEYS: &[&str] = &["api_token"];

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if SECRET_KEYS.contains(&key.as_str()) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProviderConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a required, non-blank value.
    pub fn require(&self, provider: &str, key: &str) -> Result<&str, ProviderError> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ProviderError::config(
                provider,
                format!("configuration does not contain '{key}'"),
            )),
        }
    }

    /// Parses the comma-delimited `tags` value.
    pub fn tags(&self) -> Vec<String> {
        self.get("tags").map(split_tags).unwrap_or_default()
    }
}

/// Splits a comma-delimited tag list, dropping blanks.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Merges two tag lists, keeping first occurrences in order.
pub fn merge_tags(base: &[String], extra: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(base.len() + extra.len());
    for tag in base.iter().chain(extra) {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged
}
