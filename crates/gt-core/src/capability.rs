//! Capability declarations and project/task references.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Optional concepts a provider may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Projects,
    Tasks,
}

impl Capability {
    /// Singular noun for one entity of this kind.
    pub const fn entity(self) -> &'static str {
        match self {
            Self::Projects => "project",
            Self::Tasks => "task",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Projects => "projects",
            Self::Tasks => "tasks",
        };
        write!(f, "{s}")
    }
}

/// Static capability set of a provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub projects: bool,
    pub tasks: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        projects: false,
        tasks: false,
    };
    pub const ALL: Self = Self {
        projects: true,
        tasks: true,
    };

    pub const fn supports(self, capability: Capability) -> bool {
        match capability {
            Capability::Projects => self.projects,
            Capability::Tasks => self.tasks,
        }
    }

    /// Rejects a non-null reference for a capability the provider lacks.
    ///
    /// This is the single pre-condition the session controller runs before
    /// any provider is contacted.
    pub fn check<T>(
        self,
        provider: &str,
        capability: Capability,
        value: Option<&T>,
    ) -> Result<(), ProviderError> {
        if value.is_some() && !self.supports(capability) {
            return Err(ProviderError::UnsupportedCapability {
                provider: provider.to_string(),
                capability,
            });
        }
        Ok(())
    }
}

/// Reference to a backend entity: either a resolved id or a name to look up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(u64),
    Name(String),
}

pub type ProjectRef = EntityRef;
pub type TaskRef = EntityRef;

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for EntityRef {
    /// All-digit input is treated as an id, anything else as a name.
    fn from(s: &str) -> Self {
        s.parse::<u64>()
            .map_or_else(|_| Self::Name(s.to_string()), Self::Id)
    }
}

impl FromStr for EntityRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
