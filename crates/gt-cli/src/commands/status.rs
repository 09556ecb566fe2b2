//! Status command for showing running entries per provider.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use gt_core::{ProviderStatus, SessionController};

use crate::{RepoConfig, hooks};

pub fn run<W: Write>(
    writer: &mut W,
    repo: &Path,
    repo_config: &RepoConfig,
    controller: &SessionController,
) -> Result<()> {
    let statuses = controller.status()?;
    render(writer, repo, repo_config, hooks::is_installed(repo)?, &statuses)
}

fn render<W: Write>(
    writer: &mut W,
    repo: &Path,
    repo_config: &RepoConfig,
    hooks_installed: bool,
    statuses: &[ProviderStatus],
) -> Result<()> {
    writeln!(writer, "gitrack status")?;
    writeln!(writer, "Repository: {}", repo.display())?;
    writeln!(
        writer,
        "Hooks: {}",
        if hooks_installed { "installed" } else { "not installed" }
    )?;
    if repo_config.restart_on_commit {
        writeln!(writer, "Restart on commit: yes")?;
    }

    writeln!(writer, "Providers:")?;
    for status in statuses {
        match (status.running, status.description.as_deref()) {
            (true, Some(description)) => {
                writeln!(writer, "- {}: running (\"{description}\")", status.name)?;
            }
            (true, None) => writeln!(writer, "- {}: running", status.name)?,
            (false, _) => writeln!(writer, "- {}: stopped", status.name)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn status_lists_each_provider() {
        let repo_config = RepoConfig {
            restart_on_commit: true,
            providers: Vec::new(),
        };
        let statuses = vec![
            ProviderStatus {
                name: "toggl".to_string(),
                running: true,
                description: Some("wip".to_string()),
            },
            ProviderStatus {
                name: "journal".to_string(),
                running: true,
                description: None,
            },
            ProviderStatus {
                name: "other".to_string(),
                running: false,
                description: None,
            },
        ];

        let mut output = Vec::new();
        render(&mut output, Path::new("/repo"), &repo_config, true, &statuses).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r#"
        gitrack status
        Repository: /repo
        Hooks: installed
        Restart on commit: yes
        Providers:
        - toggl: running ("wip")
        - journal: running
        - other: stopped
        "#);
    }

    #[test]
    fn status_without_hooks() {
        let statuses = vec![ProviderStatus {
            name: "journal".to_string(),
            running: false,
            description: None,
        }];

        let mut output = Vec::new();
        render(&mut output, Path::new("/repo"), &RepoConfig::default(), false, &statuses).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Hooks: not installed"));
        assert!(!output.contains("Restart on commit"));
        assert!(output.ends_with("- journal: stopped\n"));
    }
}
