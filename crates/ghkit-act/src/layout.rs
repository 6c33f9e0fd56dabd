//! Where the harness finds workflows and test fixtures.
//!
//! ```text
//! .github/workflows/<name>.yml
//! .github/test/events/<event>.events.json
//! .github/test/inputs/<workflow>.json
//! .github/test/inputs/workflow_dispatch.json
//! .github/test/env/.env
//! .github/test/env/.env.github.<env>.variables
//! .github/test/env/.env.github.<env>.secrets
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

/// Fixture paths rooted at a repository checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureLayout {
    pub repo_root: PathBuf,
}

impl FixtureLayout {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    fn test_dir(&self) -> PathBuf {
        self.repo_root.join(".github").join("test")
    }

    fn env_dir(&self) -> PathBuf {
        self.test_dir().join("env")
    }

    /// Workflow file for `name`. Prefers `.yml`, falls back to an existing
    /// `.yaml`. A name that already carries either extension is used as-is.
    pub fn workflow_path(&self, name: &str) -> PathBuf {
        let dir = self.repo_root.join(".github").join("workflows");
        if name.ends_with(".yml") || name.ends_with(".yaml") {
            return dir.join(name);
        }
        let yml = dir.join(format!("{name}.yml"));
        let yaml = dir.join(format!("{name}.yaml"));
        if !yml.exists() && yaml.exists() {
            yaml
        } else {
            yml
        }
    }

    pub fn events_file(&self, event: &str) -> PathBuf {
        self.test_dir()
            .join("events")
            .join(format!("{event}.events.json"))
    }

    pub fn inputs_file(&self, workflow: &str) -> PathBuf {
        self.test_dir().join("inputs").join(format!("{workflow}.json"))
    }

    pub fn generic_inputs_file(&self) -> PathBuf {
        self.test_dir().join("inputs").join("workflow_dispatch.json")
    }

    pub fn shared_secrets_file(&self) -> PathBuf {
        self.env_dir().join(".env")
    }

    pub fn env_var_file(&self, environment: &str) -> PathBuf {
        self.env_dir()
            .join(format!(".env.github.{environment}.variables"))
    }

    pub fn env_secret_file(&self, environment: &str) -> PathBuf {
        self.env_dir()
            .join(format!(".env.github.{environment}.secrets"))
    }
}

/// Create an empty `{}` event payload if none exists yet.
pub fn ensure_event_file_exists(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, "{}\n")?;
    info!(path = %path.display(), "created empty event payload");
    Ok(())
}
