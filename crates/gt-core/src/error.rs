//! Error taxonomy shared by providers and the session controller.

use std::fmt;

use thiserror::Error;

use crate::capability::Capability;

/// Errors raised by a single provider.
///
/// Every variant carries the provider name so that errors aggregated across
/// providers remain attributable.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing or invalid credentials/settings at construction time.
    #[error("{provider}: {message}")]
    Config { provider: String, message: String },
    /// A start was attempted while an entry is running and `force` was not set.
    #[error("{provider}: there is currently running another time entry which would be overridden{}", describe(.description.as_deref()))]
    RunningEntry {
        provider: String,
        description: Option<String>,
    },
    /// A project or task was supplied to a provider that does not support it.
    #[error("{provider}: provider does not support {capability}")]
    UnsupportedCapability {
        provider: String,
        capability: Capability,
    },
    /// A by-name lookup matched zero or several entities.
    #[error("{provider}: {} '{name}' matched {matches} entities, expected exactly one", .kind.entity())]
    LookupAmbiguity {
        provider: String,
        kind: Capability,
        name: String,
        matches: usize,
    },
    /// The backend was unreachable or answered unexpectedly.
    #[error("{provider}: {message}")]
    Network { provider: String, message: String },
    /// Local I/O failed (prompting, journal files).
    #[error("{provider}: {context}: {source}")]
    Io {
        provider: String,
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe(description: Option<&str>) -> String {
    match description {
        Some(d) if !d.is_empty() => format!(" (running: \"{d}\")"),
        _ => String::new(),
    }
}

impl ProviderError {
    /// Name of the provider that raised the error.
    pub fn provider(&self) -> &str {
        match self {
            Self::Config { provider, .. }
            | Self::RunningEntry { provider, .. }
            | Self::UnsupportedCapability { provider, .. }
            | Self::LookupAmbiguity { provider, .. }
            | Self::Network { provider, .. }
            | Self::Io { provider, .. } => provider,
        }
    }

    pub fn config(provider: &str, message: impl Into<String>) -> Self {
        Self::Config {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn network(provider: &str, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn io(provider: &str, context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            provider: provider.to_string(),
            context: context.into(),
            source,
        }
    }
}

/// Failures collected while cancelling across providers.
///
/// Cancellation keeps going after a provider fails, so more than one error
/// can be reported at once.
#[derive(Debug)]
pub struct CancelFailures(pub Vec<ProviderError>);

impl CancelFailures {
    pub fn errors(&self) -> &[ProviderError] {
        &self.0
    }
}

impl fmt::Display for CancelFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to cancel on {} provider(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CancelFailures {}

/// Session controller errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A provider call failed; the kind is passed through unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// One or more providers failed to cancel.
    #[error(transparent)]
    Cancel(#[from] CancelFailures),
    /// The repository binding names no providers.
    #[error("no providers are configured for this repository")]
    NoProviders,
}
