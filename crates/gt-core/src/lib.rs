//! Core domain logic for gitrack.
//!
//! This crate contains:
//! - The provider contract every time-tracking backend implements
//! - Capability declarations and the shared project/task pre-check
//! - The session controller driving providers through start/stop/cancel
//! - The hook adapter mapping git lifecycle events onto the controller
//! - The `journal` provider, a local file-backed backend

pub mod capability;
mod error;
pub mod hook;
pub mod journal;
pub mod provider;
pub mod session;
#[cfg(test)]
mod testing;

pub use capability::{Capabilities, Capability, EntityRef, ProjectRef, TaskRef};
pub use error::{CancelFailures, ProviderError, SessionError};
pub use hook::{HookEvent, HookKind, HookOutcome, HookPolicy, UnknownHookEvent};
pub use journal::JournalProvider;
pub use provider::{Outcome, Prompt, Provider, ProviderConfig, ProviderFactory, RunningEntry};
pub use session::{Ledger, ProviderBinding, ProviderStatus, SessionController, Transition};
