//! In-memory provider used by unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::capability::{Capabilities, ProjectRef, TaskRef};
use crate::error::ProviderError;
use crate::provider::{Outcome, Provider, RunningEntry};

#[derive(Debug, Default)]
pub struct FakeState {
    pub running: Option<RunningEntry>,
    pub finished: Vec<String>,
    pub calls: Vec<String>,
    pub fail_query: bool,
    pub fail_cancel: bool,
    pub starts: usize,
}

/// Provider whose state is shared with the test through `Rc<RefCell<_>>`.
#[derive(Debug)]
pub struct FakeProvider {
    pub name: String,
    pub capabilities: Capabilities,
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeProvider {
    pub fn new(name: &str, capabilities: Capabilities) -> (Self, Rc<RefCell<FakeState>>) {
        let state = Rc::new(RefCell::new(FakeState::default()));
        let provider = Self {
            name: name.to_string(),
            capabilities,
            state: Rc::clone(&state),
        };
        (provider, state)
    }

    pub fn boxed(name: &str, capabilities: Capabilities) -> (Box<dyn Provider>, Rc<RefCell<FakeState>>) {
        let (provider, state) = Self::new(name, capabilities);
        (Box::new(provider), state)
    }
}

impl Provider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn current(&self) -> Result<Option<RunningEntry>, ProviderError> {
        let mut state = self.state.borrow_mut();
        state.calls.push("current".to_string());
        if state.fail_query {
            return Err(ProviderError::network(&self.name, "backend unreachable"));
        }
        Ok(state.running.clone())
    }

    fn start(
        &mut self,
        project: Option<&ProjectRef>,
        _tags: &[String],
        force: bool,
    ) -> Result<Outcome, ProviderError> {
        self.check_project(project)?;
        let current = self.current()?;
        let mut state = self.state.borrow_mut();
        state.calls.push(format!(
            "start:{}",
            project.map(ToString::to_string).unwrap_or_default()
        ));
        if let Some(entry) = current {
            if !force {
                return Err(ProviderError::RunningEntry {
                    provider: self.name.clone(),
                    description: entry.description,
                });
            }
            state.running = Some(RunningEntry::default());
            state.starts += 1;
            return Ok(Outcome::Replaced);
        }
        state.running = Some(RunningEntry::default());
        state.starts += 1;
        Ok(Outcome::Applied)
    }

    fn stop(
        &mut self,
        description: &str,
        _task: Option<&TaskRef>,
        _force: bool,
    ) -> Result<Outcome, ProviderError> {
        let mut state = self.state.borrow_mut();
        state.calls.push("stop".to_string());
        if state.running.take().is_none() {
            return Ok(Outcome::NoEntry);
        }
        state.finished.push(description.to_string());
        Ok(Outcome::Applied)
    }

    fn cancel(&mut self) -> Result<Outcome, ProviderError> {
        let mut state = self.state.borrow_mut();
        state.calls.push("cancel".to_string());
        if state.fail_cancel {
            return Err(ProviderError::network(&self.name, "cancel rejected"));
        }
        if state.running.take().is_none() {
            return Ok(Outcome::NoEntry);
        }
        Ok(Outcome::Applied)
    }
}
