//! Session lifecycle across the providers bound to one repository.
//!
//! A session is never stored: its state is whatever the providers report.
//! Every transition runs in two phases, in configuration order:
//!
//! 1. the provider performs the backend operation;
//! 2. the controller records the outcome in its [`Ledger`] and logs it.
//!
//! # Known limitation
//!
//! `start_session` checks every provider before starting any, but nothing
//! prevents another process from starting an entry between that check and
//! the start call. Backends offer no lock to close this window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::{EntityRef, ProjectRef, TaskRef};
use crate::error::{CancelFailures, ProviderError, SessionError};
use crate::provider::{Outcome, Provider};

/// Per-repository settings of one configured provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBinding {
    /// Provider name, e.g. `toggl`.
    pub name: String,
    /// Project used when the caller supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<EntityRef>,
    /// Task used when the caller supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<EntityRef>,
    /// Extra tags added to every entry started for this repository.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ProviderBinding {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Lifecycle operation applied to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Start,
    Stop,
    Cancel,
}

/// One post-processed provider transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub provider: String,
    pub transition: Transition,
    pub outcome: Outcome,
    pub at: DateTime<Utc>,
}

/// Local bookkeeping of transitions applied during this invocation.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<TransitionRecord>,
}

impl Ledger {
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    /// Outcomes for one transition kind, in provider order.
    pub fn outcomes(&self, transition: Transition) -> Vec<(&str, Outcome)> {
        self.records
            .iter()
            .filter(|r| r.transition == transition)
            .map(|r| (r.provider.as_str(), r.outcome))
            .collect()
    }

    fn record(&mut self, provider: &str, transition: Transition, outcome: Outcome) {
        self.records.push(TransitionRecord {
            provider: provider.to_string(),
            transition,
            outcome,
            at: Utc::now(),
        });
    }
}

/// Running state reported by one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub running: bool,
    pub description: Option<String>,
}

struct Slot {
    binding: ProviderBinding,
    provider: Box<dyn Provider>,
}

/// Drives the configured providers through matched lifecycle calls.
pub struct SessionController {
    slots: Vec<Slot>,
    ledger: Ledger,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field(
                "providers",
                &self.slots.iter().map(|s| s.binding.name.as_str()).collect::<Vec<_>>(),
            )
            .field("ledger", &self.ledger)
            .finish()
    }
}

impl SessionController {
    /// Creates a controller over already-constructed providers.
    pub fn new(
        providers: Vec<(ProviderBinding, Box<dyn Provider>)>,
    ) -> Result<Self, SessionError> {
        if providers.is_empty() {
            return Err(SessionError::NoProviders);
        }
        let slots = providers
            .into_iter()
            .map(|(binding, provider)| Slot { binding, provider })
            .collect();
        Ok(Self {
            slots,
            ledger: Ledger::default(),
        })
    }

    /// Constructs every bound provider before returning.
    ///
    /// The first construction failure aborts, so no lifecycle call can run
    /// against a partially configured repository.
    pub fn build<F>(bindings: &[ProviderBinding], mut factory: F) -> Result<Self, SessionError>
    where
        F: FnMut(&ProviderBinding) -> Result<Box<dyn Provider>, ProviderError>,
    {
        let mut providers = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let provider = factory(binding)?;
            tracing::debug!(provider = %binding.name, "constructed provider");
            providers.push((binding.clone(), provider));
        }
        Self::new(providers)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.binding.name.as_str())
    }

    /// Starts an entry on every provider.
    ///
    /// All providers are checked for capabilities and running entries before
    /// any of them is started; without `force`, one running entry anywhere
    /// aborts the whole operation.
    pub fn start_session(
        &mut self,
        project: Option<&ProjectRef>,
        force: bool,
    ) -> Result<(), SessionError> {
        for slot in &self.slots {
            let project = project.or(slot.binding.project.as_ref());
            slot.provider.check_project(project)?;
        }

        for slot in &self.slots {
            if let Some(entry) = slot.provider.current()? {
                if !force {
                    return Err(ProviderError::RunningEntry {
                        provider: slot.binding.name.clone(),
                        description: entry.description,
                    }
                    .into());
                }
                tracing::warn!(
                    provider = %slot.binding.name,
                    description = entry.description.as_deref().unwrap_or(""),
                    "overriding running entry"
                );
            }
        }

        for slot in &mut self.slots {
            let project = project.or(slot.binding.project.as_ref());
            let outcome = slot.provider.start(project, &slot.binding.tags, force)?;
            Self::after(&mut self.ledger, &slot.binding.name, Transition::Start, outcome);
        }
        Ok(())
    }

    /// Stops and finalizes the entry on every provider.
    ///
    /// Providers with nothing running are skipped.
    pub fn stop_session(
        &mut self,
        description: &str,
        task: Option<&TaskRef>,
        force: bool,
    ) -> Result<(), SessionError> {
        for slot in &self.slots {
            let task = task.or(slot.binding.task.as_ref());
            slot.provider.check_task(task)?;
        }

        for slot in &mut self.slots {
            let task = task.or(slot.binding.task.as_ref());
            let outcome = slot.provider.stop(description, task, force)?;
            Self::after(&mut self.ledger, &slot.binding.name, Transition::Stop, outcome);
        }
        Ok(())
    }

    /// Discards the running entry on every provider.
    ///
    /// Keeps going after a failure and reports all failures together.
    pub fn cancel_session(&mut self) -> Result<(), SessionError> {
        let mut failures = Vec::new();
        for slot in &mut self.slots {
            match slot.provider.cancel() {
                Ok(outcome) => {
                    Self::after(&mut self.ledger, &slot.binding.name, Transition::Cancel, outcome);
                }
                Err(err) => {
                    tracing::warn!(provider = %slot.binding.name, error = %err, "cancel failed");
                    failures.push(err);
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CancelFailures(failures).into())
        }
    }

    /// Whether any provider reports a running entry.
    ///
    /// Returns as soon as one provider answers yes. A failed query before
    /// that is an error, never a "no".
    pub fn is_any_session_running(&self) -> Result<bool, SessionError> {
        for slot in &self.slots {
            if slot.provider.is_running()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Queries every provider for its running entry.
    pub fn status(&self) -> Result<Vec<ProviderStatus>, SessionError> {
        self.slots
            .iter()
            .map(|slot| {
                let current = slot.provider.current()?;
                Ok(ProviderStatus {
                    name: slot.binding.name.clone(),
                    running: current.is_some(),
                    description: current.and_then(|e| e.description),
                })
            })
            .collect()
    }

    fn after(ledger: &mut Ledger, provider: &str, transition: Transition, outcome: Outcome) {
        match outcome {
            Outcome::NoEntry => {
                tracing::debug!(provider, ?transition, "nothing running, skipped");
            }
            Outcome::Applied | Outcome::Replaced => {
                tracing::info!(provider, ?transition, ?outcome, "transition applied");
            }
        }
        ledger.record(provider, transition, outcome);
    }
}
