//! Maps git lifecycle events onto session transitions.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::capability::{ProjectRef, TaskRef};
use crate::error::SessionError;
use crate::session::SessionController;

/// A git lifecycle trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    PreCommit,
    PostCommit { message: String },
    Abort,
}

/// Kind of hook, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    PreCommit,
    PostCommit,
    Abort,
}

#[derive(Debug, Error)]
#[error("unknown hook event: {0}")]
pub struct UnknownHookEvent(pub String);

impl HookKind {
    pub const ALL: [Self; 3] = [Self::PreCommit, Self::PostCommit, Self::Abort];

    /// Hooks that git itself invokes and that get installed as scripts.
    pub const GIT: [Self; 2] = [Self::PreCommit, Self::PostCommit];
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PreCommit => "pre-commit",
            Self::PostCommit => "post-commit",
            Self::Abort => "abort",
        };
        write!(f, "{s}")
    }
}

impl FromStr for HookKind {
    type Err = UnknownHookEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-commit" => Ok(Self::PreCommit),
            "post-commit" => Ok(Self::PostCommit),
            "abort" => Ok(Self::Abort),
            _ => Err(UnknownHookEvent(s.to_string())),
        }
    }
}

impl HookEvent {
    /// Builds the event for a hook kind; `message` is only used by post-commit.
    pub fn new(kind: HookKind, message: Option<&str>) -> Self {
        match kind {
            HookKind::PreCommit => Self::PreCommit,
            HookKind::PostCommit => Self::PostCommit {
                message: message.unwrap_or_default().to_string(),
            },
            HookKind::Abort => Self::Abort,
        }
    }

    pub const fn kind(&self) -> HookKind {
        match self {
            Self::PreCommit => HookKind::PreCommit,
            Self::PostCommit { .. } => HookKind::PostCommit,
            Self::Abort => HookKind::Abort,
        }
    }
}

/// Repository-level settings, already resolved by the configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookPolicy {
    pub project: Option<ProjectRef>,
    pub task: Option<TaskRef>,
    /// Start a fresh entry right after a post-commit stop.
    pub restart_on_commit: bool,
}

/// What a hook invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Started,
    Stopped,
    Restarted,
    Cancelled,
    Skipped,
}

impl fmt::Display for HookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Restarted => "restarted",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// First non-blank line of a commit message.
pub fn commit_summary(message: &str) -> &str {
    message
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

/// Runs the transition for one hook event.
///
/// Hooks never force: an entry already running makes pre-commit fail.
pub fn dispatch(
    controller: &mut SessionController,
    event: &HookEvent,
    policy: &HookPolicy,
) -> Result<HookOutcome, SessionError> {
    tracing::debug!(hook = %event.kind(), "dispatching hook event");
    match event {
        HookEvent::PreCommit => {
            // The previous post-commit already started the entry.
            if policy.restart_on_commit && controller.is_any_session_running()? {
                return Ok(HookOutcome::Skipped);
            }
            controller.start_session(policy.project.as_ref(), false)?;
            Ok(HookOutcome::Started)
        }
        HookEvent::PostCommit { message } => {
            if !controller.is_any_session_running()? {
                return Ok(HookOutcome::Skipped);
            }
            controller.stop_session(commit_summary(message), policy.task.as_ref(), false)?;
            if policy.restart_on_commit {
                controller.start_session(policy.project.as_ref(), false)?;
                return Ok(HookOutcome::Restarted);
            }
            Ok(HookOutcome::Stopped)
        }
        HookEvent::Abort => {
            controller.cancel_session()?;
            Ok(HookOutcome::Cancelled)
        }
    }
}
