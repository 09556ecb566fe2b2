//! Toggl-backed implementation of the provider contract.

use gt_core::provider::merge_tags;
use gt_core::{
    Capabilities, Capability, EntityRef, Outcome, ProjectRef, Prompt, Provider, ProviderConfig,
    ProviderError, ProviderFactory, RunningEntry, TaskRef,
};

use crate::api::{ApiError, DEFAULT_API_URL, EntryUpdate, HttpClient, NewTimeEntry, TimeEntry, TogglApi};

/// Provider tracking time in Toggl Track.
///
/// Configuration keys: `api_token` (required), `tags`, `workspace_id`,
/// `api_url`.
#[derive(Debug)]
pub struct TogglProvider<A = HttpClient> {
    api: A,
    tags: Vec<String>,
    workspace_id: Option<u64>,
}

const NAME: &str = "toggl";

impl<A: TogglApi> TogglProvider<A> {
    pub fn with_api(api: A, tags: Vec<String>, workspace_id: Option<u64>) -> Self {
        Self {
            api,
            tags,
            workspace_id,
        }
    }

    fn current_entry(&self) -> Result<Option<TimeEntry>, ProviderError> {
        self.api.current_entry().map_err(api_error)
    }

    /// Configured workspace, else the account's default one.
    fn workspace(&mut self) -> Result<u64, ProviderError> {
        if let Some(id) = self.workspace_id {
            return Ok(id);
        }
        let id = self.api.me().map_err(api_error)?.default_workspace_id;
        self.workspace_id = Some(id);
        Ok(id)
    }

    fn resolve_project(&self, workspace_id: u64, project: &ProjectRef) -> Result<u64, ProviderError> {
        match project {
            EntityRef::Id(id) => Ok(*id),
            EntityRef::Name(name) => {
                let projects = self.api.projects().map_err(api_error)?;
                unique(
                    Capability::Projects,
                    name,
                    projects
                        .iter()
                        .filter(|p| p.workspace_id == workspace_id && p.name == *name)
                        .map(|p| p.id),
                )
            }
        }
    }

    fn resolve_task(&self, entry: &TimeEntry, task: &TaskRef) -> Result<u64, ProviderError> {
        match task {
            EntityRef::Id(id) => Ok(*id),
            EntityRef::Name(name) => {
                let tasks = self.api.tasks().map_err(api_error)?;
                unique(
                    Capability::Tasks,
                    name,
                    tasks
                        .iter()
                        .filter(|t| t.workspace_id == entry.workspace_id && t.name == *name)
                        .filter(|t| entry.project_id.is_none() || t.project_id == entry.project_id)
                        .map(|t| t.id),
                )
            }
        }
    }
}

/// Exactly one id must match a by-name lookup.
fn unique(
    kind: Capability,
    name: &str,
    ids: impl Iterator<Item = u64>,
) -> Result<u64, ProviderError> {
    let ids: Vec<u64> = ids.collect();
    match ids.as_slice() {
        [id] => Ok(*id),
        _ => Err(ProviderError::LookupAmbiguity {
            provider: NAME.to_string(),
            kind,
            name: name.to_string(),
            matches: ids.len(),
        }),
    }
}

fn api_error(err: ApiError) -> ProviderError {
    match err {
        ApiError::EmptyToken | ApiError::Unauthorized { .. } => {
            ProviderError::config(NAME, format!("credentials were rejected: {err}"))
        }
        _ => ProviderError::network(NAME, err.to_string()),
    }
}

impl<A: TogglApi> Provider for TogglProvider<A> {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn current(&self) -> Result<Option<RunningEntry>, ProviderError> {
        Ok(self.current_entry()?.map(|entry| RunningEntry {
            description: entry.description.filter(|d| !d.is_empty()),
        }))
    }

    fn start(
        &mut self,
        project: Option<&ProjectRef>,
        tags: &[String],
        force: bool,
    ) -> Result<Outcome, ProviderError> {
        self.check_project(project)?;
        let current = self.current_entry()?;
        if let Some(entry) = &current {
            tracing::info!(
                description = entry.description.as_deref().unwrap_or(""),
                "currently running entry"
            );
            if !force {
                return Err(ProviderError::RunningEntry {
                    provider: NAME.to_string(),
                    description: entry.description.clone().filter(|d| !d.is_empty()),
                });
            }
        }

        let workspace_id = self.workspace()?;
        let project_id = project
            .map(|p| self.resolve_project(workspace_id, p))
            .transpose()?;

        // Forced start: stop the old entry so only the new one runs.
        if let Some(entry) = &current {
            self.api.stop_entry(entry).map_err(api_error)?;
        }

        let new_entry = NewTimeEntry::running(workspace_id, project_id, merge_tags(&self.tags, tags));
        let created = self.api.create_entry(&new_entry).map_err(api_error)?;
        tracing::debug!(entry_id = created.id, workspace_id, "created toggl entry");

        Ok(if current.is_some() {
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
        let Some(entry) = self.current_entry()? else {
            return Ok(Outcome::NoEntry);
        };

        let task_id = task.map(|t| self.resolve_task(&entry, t)).transpose()?;
        let update = EntryUpdate {
            description: description.to_string(),
            task_id,
        };
        let updated = self.api.update_entry(&entry, &update).map_err(api_error)?;
        self.api.stop_entry(&updated).map_err(api_error)?;
        tracing::debug!(entry_id = entry.id, "stopped toggl entry");
        Ok(Outcome::Applied)
    }

    fn cancel(&mut self) -> Result<Outcome, ProviderError> {
        let Some(entry) = self.current_entry()? else {
            return Ok(Outcome::NoEntry);
        };
        self.api.delete_entry(&entry).map_err(api_error)?;
        tracing::debug!(entry_id = entry.id, "deleted toggl entry");
        Ok(Outcome::Applied)
    }
}

impl TogglProvider<HttpClient> {
    fn init_at(prompt: &mut dyn Prompt, base_url: &str) -> Result<ProviderConfig, ProviderError> {
        let api_token = prompt
            .secret("Toggl API token (see https://track.toggl.com/profile)")
            .map_err(|e| ProviderError::io(NAME, "failed to read API token", e))?;
        let api_token = api_token.trim().to_string();

        let client = HttpClient::with_base_url(&api_token, base_url).map_err(api_error)?;
        let me = client.me().map_err(api_error)?;
        tracing::debug!(user = me.id, workspace = me.default_workspace_id, "validated toggl token");

        let tags = prompt
            .text(
                "Should the gitrack entries be tagged? (tags delimited by ',')",
                Some(""),
            )
            .map_err(|e| ProviderError::io(NAME, "failed to read tags", e))?;

        let mut config = ProviderConfig::new();
        config.insert("api_token", api_token);
        if !tags.trim().is_empty() {
            config.insert("tags", tags.trim());
        }
        if base_url != DEFAULT_API_URL {
            config.insert("api_url", base_url);
        }
        Ok(config)
    }
}

impl ProviderFactory for TogglProvider<HttpClient> {
    const NAME: &'static str = NAME;
    const CAPABILITIES: Capabilities = Capabilities::ALL;

    fn init(prompt: &mut dyn Prompt) -> Result<ProviderConfig, ProviderError> {
        Self::init_at(prompt, DEFAULT_API_URL)
    }

    fn from_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        let api_token = config.require(NAME, "api_token").map_err(|_| {
            ProviderError::config(NAME, "configuration does not contain authentication credentials ('api_token')")
        })?;
        let base_url = config.get("api_url").unwrap_or(DEFAULT_API_URL);
        let workspace_id = config
            .get("workspace_id")
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    ProviderError::config(NAME, format!("invalid workspace_id '{raw}'"))
                })
            })
            .transpose()?;

        let api = HttpClient::with_base_url(api_token, base_url).map_err(api_error)?;
        Ok(Self::with_api(api, config.tags(), workspace_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;

    use httpmock::prelude::*;
    use serde_json::json;

    use crate::api::{Me, Project, Task};

    #[derive(Debug, Default)]
    struct FakeApi {
        running: RefCell<Option<TimeEntry>>,
        finished: RefCell<Vec<TimeEntry>>,
        created: RefCell<Vec<NewTimeEntry>>,
        deleted: RefCell<Vec<u64>>,
        projects: Vec<Project>,
        tasks: Vec<Task>,
        me_calls: RefCell<usize>,
        offline: bool,
    }

    impl FakeApi {
        fn check(&self) -> Result<(), ApiError> {
            if self.offline {
                return Err(ApiError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    fn running_entry(id: u64, description: &str) -> TimeEntry {
        TimeEntry {
            id,
            workspace_id: 10,
            description: Some(description.to_string()),
            project_id: None,
            task_id: None,
            tags: None,
            start: "2026-01-01T10:00:00Z".to_string(),
            duration: -1,
        }
    }

    impl TogglApi for &FakeApi {
        fn me(&self) -> Result<Me, ApiError> {
            self.check()?;
            *self.me_calls.borrow_mut() += 1;
            Ok(Me {
                id: 1,
                default_workspace_id: 10,
                fullname: None,
            })
        }

        fn current_entry(&self) -> Result<Option<TimeEntry>, ApiError> {
            self.check()?;
            Ok(self.running.borrow().clone())
        }

        fn create_entry(&self, entry: &NewTimeEntry) -> Result<TimeEntry, ApiError> {
            self.check()?;
            self.created.borrow_mut().push(entry.clone());
            let created = TimeEntry {
                project_id: entry.project_id,
                tags: Some(entry.tags.clone()),
                ..running_entry(100 + self.created.borrow().len() as u64, "")
            };
            *self.running.borrow_mut() = Some(created.clone());
            Ok(created)
        }

        fn update_entry(&self, entry: &TimeEntry, update: &EntryUpdate) -> Result<TimeEntry, ApiError> {
            self.check()?;
            let updated = TimeEntry {
                description: Some(update.description.clone()),
                task_id: update.task_id,
                ..entry.clone()
            };
            *self.running.borrow_mut() = Some(updated.clone());
            Ok(updated)
        }

        fn stop_entry(&self, entry: &TimeEntry) -> Result<TimeEntry, ApiError> {
            self.check()?;
            self.running.borrow_mut().take();
            let stopped = TimeEntry {
                duration: 60,
                ..entry.clone()
            };
            self.finished.borrow_mut().push(stopped.clone());
            Ok(stopped)
        }

        fn delete_entry(&self, entry: &TimeEntry) -> Result<(), ApiError> {
            self.check()?;
            self.running.borrow_mut().take();
            self.deleted.borrow_mut().push(entry.id);
            Ok(())
        }

        fn projects(&self) -> Result<Vec<Project>, ApiError> {
            self.check()?;
            Ok(self.projects.clone())
        }

        fn tasks(&self) -> Result<Vec<Task>, ApiError> {
            self.check()?;
            Ok(self.tasks.clone())
        }
    }

    fn project(id: u64, name: &str) -> Project {
        Project {
            id,
            workspace_id: 10,
            name: name.to_string(),
        }
    }

    fn provider(api: &FakeApi) -> TogglProvider<&FakeApi> {
        TogglProvider::with_api(api, vec!["gitrack".to_string()], None)
    }

    #[test]
    fn start_creates_running_entry_with_tags() {
        let api = FakeApi::default();
        let mut toggl = provider(&api);

        assert!(!toggl.is_running().unwrap());
        let outcome = toggl.start(None, &["repo".to_string()], false).unwrap();

        assert_eq!(outcome, Outcome::Applied);
        assert!(toggl.is_running().unwrap());
        let created = api.created.borrow();
        assert_eq!(created[0].workspace_id, 10);
        assert_eq!(created[0].tags, vec!["gitrack", "repo"]);
        assert_eq!(created[0].duration, -1);
    }

    #[test]
    fn start_refuses_running_entry() {
        let api = FakeApi::default();
        *api.running.borrow_mut() = Some(running_entry(1, "old task"));
        let mut toggl = provider(&api);

        let err = toggl.start(None, &[], false).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RunningEntry { description: Some(ref d), .. } if d == "old task"
        ));
        assert!(api.created.borrow().is_empty());
        assert_eq!(api.running.borrow().as_ref().unwrap().id, 1);
    }

    #[test]
    fn forced_start_stops_then_starts() {
        let api = FakeApi::default();
        *api.running.borrow_mut() = Some(running_entry(1, "old task"));
        let mut toggl = provider(&api);

        assert_eq!(toggl.start(None, &[], true).unwrap(), Outcome::Replaced);
        assert_eq!(api.finished.borrow()[0].id, 1);
        assert_eq!(api.created.borrow().len(), 1);
        assert!(api.running.borrow().as_ref().is_some_and(|e| e.id != 1));
    }

    #[test]
    fn start_resolves_project_by_name() {
        let api = FakeApi {
            projects: vec![project(5, "Website"), project(6, "Backend")],
            ..FakeApi::default()
        };
        let mut toggl = provider(&api);

        toggl
            .start(Some(&EntityRef::Name("Backend".to_string())), &[], false)
            .unwrap();
        assert_eq!(api.created.borrow()[0].project_id, Some(6));
    }

    #[test]
    fn ambiguous_project_fails_without_starting() {
        let api = FakeApi {
            projects: vec![project(5, "Website"), project(7, "Website")],
            ..FakeApi::default()
        };
        let mut toggl = provider(&api);

        let err = toggl
            .start(Some(&EntityRef::Name("Website".to_string())), &[], false)
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::LookupAmbiguity { matches: 2, .. }
        ));
        assert!(err.to_string().contains("Website"));
        assert!(api.created.borrow().is_empty());
    }

    #[test]
    fn missing_project_fails() {
        let api = FakeApi::default();
        let mut toggl = provider(&api);

        let err = toggl
            .start(Some(&EntityRef::Name("Nope".to_string())), &[], false)
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::LookupAmbiguity { matches: 0, .. }
        ));
    }

    #[test]
    fn workspace_is_looked_up_once() {
        let api = FakeApi::default();
        let mut toggl = provider(&api);

        toggl.start(None, &[], false).unwrap();
        toggl.cancel().unwrap();
        toggl.start(None, &[], false).unwrap();
        assert_eq!(*api.me_calls.borrow(), 1);
    }

    #[test]
    fn stop_sets_description_and_task() {
        let api = FakeApi {
            tasks: vec![Task {
                id: 42,
                workspace_id: 10,
                project_id: None,
                name: "Review".to_string(),
            }],
            ..FakeApi::default()
        };
        *api.running.borrow_mut() = Some(running_entry(1, ""));
        let mut toggl = provider(&api);

        let outcome = toggl
            .stop("fix bug", Some(&EntityRef::Name("Review".to_string())), false)
            .unwrap();

        assert_eq!(outcome, Outcome::Applied);
        let finished = api.finished.borrow();
        assert_eq!(finished[0].description.as_deref(), Some("fix bug"));
        assert_eq!(finished[0].task_id, Some(42));
        assert!(!toggl.is_running().unwrap());
    }

    #[test]
    fn stop_without_entry_is_noop() {
        let api = FakeApi::default();
        let mut toggl = provider(&api);

        assert_eq!(toggl.stop("x", None, false).unwrap(), Outcome::NoEntry);
        assert_eq!(toggl.stop("x", None, false).unwrap(), Outcome::NoEntry);
        assert!(api.finished.borrow().is_empty());
    }

    #[test]
    fn cancel_deletes_running_entry() {
        let api = FakeApi::default();
        *api.running.borrow_mut() = Some(running_entry(9, "wip"));
        let mut toggl = provider(&api);

        assert_eq!(toggl.cancel().unwrap(), Outcome::Applied);
        assert_eq!(*api.deleted.borrow(), vec![9]);
        assert_eq!(toggl.cancel().unwrap(), Outcome::NoEntry);
    }

    #[test]
    fn offline_backend_is_an_error_not_false() {
        let api = FakeApi {
            offline: true,
            ..FakeApi::default()
        };
        let toggl = provider(&api);

        assert!(matches!(
            toggl.is_running().unwrap_err(),
            ProviderError::Network { .. }
        ));
    }

    #[test]
    fn from_config_requires_api_token() {
        let err = TogglProvider::<HttpClient>::from_config(ProviderConfig::new()).unwrap_err();
        assert!(matches!(err, ProviderError::Config { .. }));
        assert!(err.to_string().contains("api_token"));
    }

    #[test]
    fn from_config_rejects_bad_workspace() {
        let config: ProviderConfig = [("api_token", "tok"), ("workspace_id", "abc")]
            .into_iter()
            .collect();
        let err = TogglProvider::<HttpClient>::from_config(config).unwrap_err();
        assert!(err.to_string().contains("workspace_id"));
    }

    struct Scripted(VecDeque<&'static str>);

    impl Prompt for Scripted {
        fn secret(&mut self, _question: &str) -> io::Result<String> {
            Ok(self.0.pop_front().unwrap_or_default().to_string())
        }

        fn text(&mut self, _question: &str, _default: Option<&str>) -> io::Result<String> {
            Ok(self.0.pop_front().unwrap_or_default().to_string())
        }
    }

    #[test]
    fn init_validates_token_and_collects_tags() {
        let server = MockServer::start();
        let me = server.mock(|when, then| {
            when.method(GET).path("/me");
            then.status(200)
                .json_body(json!({"id": 1, "default_workspace_id": 10, "fullname": "Dev"}));
        });

        let mut prompt = Scripted(VecDeque::from(vec![" tok ", "gitrack,work"]));
        let config = TogglProvider::<HttpClient>::init_at(&mut prompt, &server.base_url()).unwrap();

        me.assert();
        assert_eq!(config.get("api_token"), Some("tok"));
        assert_eq!(config.tags(), vec!["gitrack", "work"]);
        assert_eq!(config.get("api_url"), Some(server.base_url().as_str()));
    }

    #[test]
    fn init_rejects_invalid_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/me");
            then.status(403);
        });

        let mut prompt = Scripted(VecDeque::from(vec!["bad"]));
        let err = TogglProvider::<HttpClient>::init_at(&mut prompt, &server.base_url()).unwrap_err();
        assert!(matches!(err, ProviderError::Config { .. }));
    }

    #[test]
    fn http_provider_round_trip() {
        let server = MockServer::start();
        let current = server.mock(|when, then| {
            when.method(GET).path("/me/time_entries/current");
            then.status(200)
                .header("content-type", "application/json")
                .body("null");
        });
        let create = server.mock(|when, then| {
            when.method(POST).path("/workspaces/77/time_entries");
            then.status(200).json_body(json!({
                "id": 5,
                "workspace_id": 77,
                "start": "2026-01-01T10:00:00Z",
                "duration": -1
            }));
        });

        let config: ProviderConfig = [
            ("api_token", "tok"),
            ("workspace_id", "77"),
            ("api_url", server.base_url().as_str()),
        ]
        .into_iter()
        .collect();
        let mut toggl = TogglProvider::<HttpClient>::from_config(config).unwrap();

        assert_eq!(toggl.start(None, &[], false).unwrap(), Outcome::Applied);
        current.assert();
        create.assert();
    }
}
