//! Provider types known to the CLI.

use gt_core::{
    Capabilities, JournalProvider, Prompt, Provider, ProviderBinding, ProviderConfig,
    ProviderError, ProviderFactory, SessionController, SessionError,
};
use gt_toggl::{HttpClient, TogglProvider};

use crate::Config;

type Toggl = TogglProvider<HttpClient>;

/// Names of all available providers.
pub const PROVIDERS: [&str; 2] = [Toggl::NAME, JournalProvider::NAME];

fn unknown(name: &str) -> ProviderError {
    ProviderError::config(
        name,
        format!("unknown provider (available: {})", PROVIDERS.join(", ")),
    )
}

pub fn capabilities(name: &str) -> Option<Capabilities> {
    match name {
        n if n == Toggl::NAME => Some(Toggl::CAPABILITIES),
        n if n == JournalProvider::NAME => Some(JournalProvider::CAPABILITIES),
        _ => None,
    }
}

/// Runs the interactive bootstrap of a provider type.
pub fn init(name: &str, prompt: &mut dyn Prompt) -> Result<ProviderConfig, ProviderError> {
    match name {
        n if n == Toggl::NAME => Toggl::init(prompt),
        n if n == JournalProvider::NAME => JournalProvider::init(prompt),
        _ => Err(unknown(name)),
    }
}

/// Constructs the provider named by `binding` from the global config.
pub fn build(binding: &ProviderBinding, config: &Config) -> Result<Box<dyn Provider>, ProviderError> {
    let fragment = config
        .providers
        .get(&binding.name)
        .cloned()
        .unwrap_or_default();
    match binding.name.as_str() {
        n if n == Toggl::NAME => Ok(Box::new(Toggl::from_config(fragment)?)),
        n if n == JournalProvider::NAME => Ok(Box::new(JournalProvider::from_config(fragment)?)),
        name => Err(unknown(name)),
    }
}

/// Builds a controller over every provider bound to the repository.
pub fn controller(
    bindings: &[ProviderBinding],
    config: &Config,
) -> Result<SessionController, SessionError> {
    SessionController::build(bindings, |binding| build(binding, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_reports_missing_credentials() {
        let err = build(&ProviderBinding::named("toggl"), &Config::default()).unwrap_err();
        assert!(matches!(err, ProviderError::Config { .. }));
        assert!(err.to_string().contains("api_token"));
    }

    #[test]
    fn build_rejects_unknown_provider() {
        let err = build(&ProviderBinding::named("harvest"), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("unknown provider"));
    }

    #[test]
    fn controller_fails_fast_when_one_provider_is_misconfigured() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.providers.insert(
            "journal".to_string(),
            [("path", temp.path().to_str().unwrap())].into_iter().collect(),
        );
        let bindings = vec![ProviderBinding::named("journal"), ProviderBinding::named("toggl")];

        let err = controller(&bindings, &config).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Provider(ProviderError::Config { .. })
        ));
        assert!(!temp.path().join("running.json").exists());
    }

    #[test]
    fn capabilities_are_declared_per_type() {
        assert_eq!(capabilities("toggl"), Some(Capabilities::ALL));
        assert_eq!(capabilities("journal"), Some(Capabilities::NONE));
        assert_eq!(capabilities("nope"), None);
    }
}
