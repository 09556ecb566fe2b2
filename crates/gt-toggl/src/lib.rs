//! Toggl Track integration for gitrack.
//!
//! [`TogglProvider`] implements the provider contract on top of the Toggl v9
//! REST API. HTTP access goes through the [`TogglApi`] trait so the provider
//! logic can be exercised without a network.

mod api;
mod provider;

pub use api::{
    ApiError, DEFAULT_API_URL, EntryUpdate, HttpClient, Me, NewTimeEntry, Project, Task, TimeEntry,
    TogglApi,
};
pub use provider::TogglProvider;
