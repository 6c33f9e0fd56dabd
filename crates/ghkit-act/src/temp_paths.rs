//! Temporary files that must outlive invocation building but not the run.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir, TempPath};
use tracing::debug;

use crate::error::Result;

/// Tracks generated secrets files and the docker-auth stub.
///
/// Paths stay on disk until [`TempPaths::cleanup`] is called or the tracker
/// is dropped.
#[derive(Debug, Default)]
pub struct TempPaths {
    files: Vec<TempPath>,
    dirs: Vec<TempDir>,
}

impl TempPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `secrets` as sorted `KEY=value` lines to a fresh temp file.
    pub fn write_secrets_file(&mut self, secrets: &BTreeMap<String, String>) -> Result<PathBuf> {
        let mut file = Builder::new()
            .prefix("gh-act-secrets-")
            .suffix(".env")
            .tempfile()?;

        let mut content = secrets
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n");
        content.push('\n');
        file.write_all(content.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path();
        let tracked = path.to_path_buf();
        debug!(path = %tracked.display(), keys = secrets.len(), "wrote secrets file");
        self.files.push(path);
        Ok(tracked)
    }

    /// Directory holding a `config.json` with no registry credentials, for
    /// use as `DOCKER_CONFIG` so pulls never pick up the host's logins.
    pub fn docker_config_stub(&mut self) -> Result<PathBuf> {
        let dir = Builder::new().prefix("gh-act-docker-").tempdir()?;
        std::fs::write(dir.path().join("config.json"), "{\"auths\":{}}\n")?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "created docker config stub");
        self.dirs.push(dir);
        Ok(path)
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.files
            .iter()
            .map(|p| &**p)
            .chain(self.dirs.iter().map(TempDir::path))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    /// Remove everything tracked. Failures are logged and ignored.
    pub fn cleanup(&mut self) {
        for path in self.files.drain(..) {
            let removed = path.to_path_buf();
            if let Err(err) = path.close() {
                debug!(path = %removed.display(), error = %err, "failed to remove temp file");
            }
        }
        for dir in self.dirs.drain(..) {
            let removed = dir.path().to_path_buf();
            if let Err(err) = dir.close() {
                debug!(path = %removed.display(), error = %err, "failed to remove temp dir");
            }
        }
    }
}
