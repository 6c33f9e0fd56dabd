//! Sequential execution of act invocations.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{error, info};

use crate::error::{HarnessError, Result};
use crate::invocation::ActInvocation;

// ---------------------------------------------------------------------------
// Executor trait
// ---------------------------------------------------------------------------

/// Backend that runs a single invocation and reports its exit code.
#[async_trait]
pub trait InvocationExecutor: Send + Sync {
    async fn execute(&self, invocation: &ActInvocation) -> Result<i32>;
}

/// Spawns the invocation as a child process sharing our stdio.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    /// Exported as `DOCKER_CONFIG` to the child when set.
    pub docker_config: Option<PathBuf>,
}

impl ProcessExecutor {
    pub fn new(docker_config: Option<PathBuf>) -> Self {
        Self { docker_config }
    }
}

#[async_trait]
impl InvocationExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &ActInvocation) -> Result<i32> {
        if invocation.program.is_empty() {
            return Err(HarnessError::EmptyCommand);
        }

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(docker_config) = &self.docker_config {
            command.env("DOCKER_CONFIG", docker_config);
        }

        let status = command.status().await?;
        Ok(status.code().unwrap_or(-1))
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Outcome of one executed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    pub command: String,
    pub job: Option<String>,
    pub exit_code: i32,
    pub duration_ms: u64,
}

/// What happened across a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Executed invocations, in order. Stops at the first failure.
    pub outcomes: Vec<InvocationOutcome>,
    /// Invocations never started because an earlier one failed.
    pub skipped: usize,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.exit_code == 0)
    }

    /// Exit code to propagate: that of the failing invocation, else 0.
    pub fn exit_code(&self) -> i32 {
        self.outcomes
            .iter()
            .map(|o| o.exit_code)
            .find(|code| *code != 0)
            .unwrap_or(0)
    }
}

/// Run invocations one at a time, stopping at the first non-zero exit.
pub async fn run_invocations<E: InvocationExecutor + ?Sized>(
    executor: &E,
    invocations: &[ActInvocation],
) -> Result<RunReport> {
    let mut report = RunReport::default();

    for (index, invocation) in invocations.iter().enumerate() {
        let command = invocation.command_line();
        info!(job = ?invocation.job, "running: {command}");

        let start = Instant::now();
        let exit_code = executor.execute(invocation).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        report.outcomes.push(InvocationOutcome {
            command,
            job: invocation.job.clone(),
            exit_code,
            duration_ms,
        });

        if exit_code != 0 {
            report.skipped = invocations.len() - index - 1;
            error!(exit_code, skipped = report.skipped, "invocation failed");
            break;
        }
    }

    Ok(report)
}
