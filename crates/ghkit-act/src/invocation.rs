//! Builds the `gh act` command lines that replay one workflow locally.
//!
//! Jobs are grouped by their declared `environment` (`testing` when unset).
//! Each group gets the group's variables file and, when there is anything to
//! put in it, one generated secrets file shared by all jobs of the group.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::env_file::{looks_like_token, parse_key_value_file};
use crate::error::{HarnessError, Result};
use crate::layout::{ensure_event_file_exists, FixtureLayout};
use crate::temp_paths::TempPaths;
use crate::workflow::parse_workflow_file;

/// Environment used for jobs that do not declare one.
pub const DEFAULT_ENVIRONMENT: &str = "testing";

const EVENT_PRIORITY: [&str; 5] = [
    "workflow_dispatch",
    "pull_request",
    "push",
    "workflow_run",
    "schedule",
];

const TOKEN_KEYS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Pick the trigger event to simulate.
pub fn choose_event(events: &BTreeSet<String>) -> &'static str {
    EVENT_PRIORITY
        .iter()
        .copied()
        .find(|event| events.contains(*event))
        .unwrap_or("push")
}

/// Which replay tool to call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActConfig {
    pub program: String,
    pub base_args: Vec<String>,
}

impl Default for ActConfig {
    fn default() -> Self {
        Self {
            program: "gh".to_string(),
            base_args: vec!["act".to_string()],
        }
    }
}

impl ActConfig {
    /// Split a command such as `gh act` or `act` into program and leading args.
    pub fn from_command(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        match parts.next() {
            Some(program) => Self {
                program,
                base_args: parts.collect(),
            },
            None => Self::default(),
        }
    }
}

/// One replay of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActInvocation {
    /// `None` for the fallback invocation of a workflow without jobs.
    pub environment: Option<String>,
    pub job: Option<String>,
    pub program: String,
    pub args: Vec<String>,
}

impl ActInvocation {
    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    pub fn command_line(&self) -> String {
        self.argv().join(" ")
    }
}

fn is_one(value: Option<&String>) -> bool {
    value.map(|v| v.trim() == "1").unwrap_or(false)
}

fn debug_enabled(environ: &HashMap<String, String>, variables: &BTreeMap<String, String>) -> bool {
    is_one(environ.get("DEBUG")) || is_one(variables.get("DEBUG"))
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// The token from the shared secrets file, if it looks real.
///
/// The first non-blank of `GITHUB_TOKEN`/`GH_TOKEN` decides; a placeholder
/// there is dropped rather than passed on.
fn shared_token(shared: &BTreeMap<String, String>, shared_path: &Path) -> Option<String> {
    for key in TOKEN_KEYS {
        let candidate = shared.get(key).map(|v| v.trim()).unwrap_or("");
        if candidate.is_empty() {
            continue;
        }
        if looks_like_token(candidate) {
            return Some(candidate.to_string());
        }
        warn!(
            "{key} in {} does not look like a GitHub token; ignoring it",
            shared_path.display()
        );
        return None;
    }
    None
}

fn event_payload(
    layout: &FixtureLayout,
    workflow_name: &str,
    event: &str,
    has_dispatch_inputs: bool,
) -> Result<Option<PathBuf>> {
    if event == "workflow_dispatch" && has_dispatch_inputs {
        let candidate = layout.inputs_file(workflow_name);
        if candidate.exists() {
            return Ok(Some(candidate));
        }
        let generic = layout.generic_inputs_file();
        if generic.exists() {
            warn!(
                "{} missing; using generic inputs file {}",
                candidate.display(),
                generic.display()
            );
            return Ok(Some(generic));
        }
        warn!(
            "workflow has workflow_dispatch inputs but no inputs file exists at {}",
            candidate.display()
        );
        return Ok(None);
    }

    let candidate = layout.events_file(event);
    ensure_event_file_exists(&candidate)?;
    Ok(Some(candidate))
}

fn workflow_stem(name: &str) -> &str {
    name.strip_suffix(".yml")
        .or_else(|| name.strip_suffix(".yaml"))
        .unwrap_or(name)
}

/// Build every invocation needed to replay `workflow_name`.
///
/// `environ` stands in for the process environment and is consulted only for
/// `DEBUG`; tokens found there are never used.
pub fn build_act_invocations(
    layout: &FixtureLayout,
    workflow_name: &str,
    environ: &HashMap<String, String>,
    config: &ActConfig,
    temp_paths: &mut TempPaths,
) -> Result<Vec<ActInvocation>> {
    let workflow_file = layout.workflow_path(workflow_name);
    let workflow_name = workflow_stem(workflow_name);
    let descriptor = parse_workflow_file(&workflow_file)?;
    let event = choose_event(&descriptor.events);
    info!(workflow = %workflow_file.display(), event, "building act invocations");

    let payload = event_payload(
        layout,
        workflow_name,
        event,
        descriptor.has_workflow_dispatch_inputs,
    )?;

    let mut environments: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for job in &descriptor.jobs {
        let environment = job
            .environment
            .clone()
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        environments.entry(environment).or_default().push(job.id.clone());
    }

    let shared_path = layout.shared_secrets_file();
    let shared = parse_key_value_file(&shared_path)?;
    let token = shared_token(&shared, &shared_path);

    let base = |debug: bool| {
        let mut args = config.base_args.clone();
        args.push(event.to_string());
        if debug {
            args.push("--verbose".to_string());
            args.extend(["--env".to_string(), "DEBUG=1".to_string()]);
        }
        args.push("--pull=false".to_string());
        args
    };

    let mut invocations = Vec::new();

    for (environment, job_ids) in &environments {
        let var_file = layout.env_var_file(environment);
        if !var_file.exists() {
            return Err(HarnessError::MissingVariablesFile {
                environment: environment.clone(),
                path: var_file,
            });
        }
        let variables = parse_key_value_file(&var_file)?;
        let debug = debug_enabled(environ, &variables);

        let mut secrets = shared.clone();
        secrets.extend(parse_key_value_file(&layout.env_secret_file(environment))?);
        match &token {
            Some(token) => {
                for key in TOKEN_KEYS {
                    secrets.insert(key.to_string(), token.clone());
                }
            }
            None => {
                for key in TOKEN_KEYS {
                    secrets.remove(key);
                }
            }
        }

        let secret_file = if secrets.is_empty() {
            info!(
                "no secrets found for environment '{environment}'. \
                 If checkout needs auth, add GITHUB_TOKEN to {}",
                shared_path.display()
            );
            None
        } else {
            Some(temp_paths.write_secrets_file(&secrets)?)
        };

        for job_id in job_ids {
            let mut args = base(debug);
            args.extend(["--var-file".to_string(), path_arg(&var_file)]);
            if let Some(secret_file) = &secret_file {
                args.extend(["--secret-file".to_string(), path_arg(secret_file)]);
            }
            args.extend(["-W".to_string(), path_arg(&workflow_file)]);
            if let Some(payload) = &payload {
                args.extend(["-e".to_string(), path_arg(payload)]);
            }
            args.extend(["-j".to_string(), job_id.clone()]);

            invocations.push(ActInvocation {
                environment: Some(environment.clone()),
                job: Some(job_id.clone()),
                program: config.program.clone(),
                args,
            });
        }
    }

    if invocations.is_empty() {
        debug!("workflow declares no jobs; building a single whole-workflow invocation");
        let mut args = base(debug_enabled(environ, &BTreeMap::new()));
        args.extend(["-W".to_string(), path_arg(&workflow_file)]);
        if let Some(payload) = &payload {
            args.extend(["-e".to_string(), path_arg(payload)]);
        }
        invocations.push(ActInvocation {
            environment: None,
            job: None,
            program: config.program.clone(),
            args,
        });
    }

    Ok(invocations)
}
