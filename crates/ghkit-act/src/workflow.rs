//! Line-oriented extractor for the subset of workflow YAML the harness needs.
//!
//! Only three facts are pulled out of a workflow: its trigger events, whether
//! `workflow_dispatch` declares `inputs`, and the `environment` of each job.
//! Everything else is skipped. Indentation is counted in spaces; a line at or
//! above the indentation of the block it belongs to closes that block before
//! the line is looked at again from the top level.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HarnessError, Result};

/// One job from the `jobs:` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowJob {
    pub id: String,
    pub environment: Option<String>,
}

/// What the harness knows about a workflow file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    pub events: BTreeSet<String>,
    pub has_workflow_dispatch_inputs: bool,
    /// Jobs in declaration order.
    pub jobs: Vec<WorkflowJob>,
}

impl WorkflowDescriptor {
    pub fn jobs_to_environment(&self) -> BTreeMap<String, Option<String>> {
        self.jobs
            .iter()
            .map(|job| (job.id.clone(), job.environment.clone()))
            .collect()
    }

    fn record_job(&mut self, id: &str) -> usize {
        match self.jobs.iter().position(|job| job.id == id) {
            Some(index) => index,
            None => {
                self.jobs.push(WorkflowJob {
                    id: id.to_string(),
                    environment: None,
                });
                self.jobs.len() - 1
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Top,
    InOnBlock {
        indent: usize,
    },
    InWorkflowDispatchBlock {
        on_indent: usize,
        dispatch_indent: usize,
    },
    InJobsBlock {
        indent: usize,
    },
    InJobBody {
        jobs_indent: usize,
        job_index: usize,
        job_indent: usize,
    },
}

struct Patterns {
    on_header: Regex,
    on_inline: Regex,
    on_scalar: Regex,
    jobs_header: Regex,
    on_key: Regex,
    inputs: Regex,
    job_header: Regex,
    environment: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |pattern: &str| Regex::new(pattern).expect("static workflow pattern");
        Patterns {
            on_header: compile(r"^\s*on:\s*$"),
            on_inline: compile(r"^\s*on:\s*\[(.*)\]\s*$"),
            on_scalar: compile(r"^\s*on:\s*([A-Za-z0-9_]+)\s*$"),
            jobs_header: compile(r"^\s*jobs:\s*$"),
            on_key: compile(r"^\s*([a-zA-Z0-9_]+)\s*:\s*(.*)$"),
            inputs: compile(r"^\s*inputs\s*:\s*$"),
            job_header: compile(r"^\s*([a-zA-Z0-9_-]+)\s*:\s*$"),
            environment: compile(r"^\s*environment\s*:\s*([^\s{\[]+)\s*$"),
        }
    })
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Cut a trailing `# comment`, unless a quote is left open before it.
fn strip_comment(line: &str) -> &str {
    if !line.contains('#') {
        return line;
    }
    let unbalanced = |quote: char| line.matches(quote).count() % 2 == 1;
    if unbalanced('"') || unbalanced('\'') {
        return line;
    }
    match line.split_once('#') {
        Some((before, _)) => before,
        None => line,
    }
}

fn trim_quotes(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Parse workflow text.
pub fn parse_workflow_str(content: &str) -> WorkflowDescriptor {
    let mut descriptor = WorkflowDescriptor::default();
    let mut state = ParserState::Top;

    for raw_line in content.lines() {
        let line = strip_comment(raw_line).trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let indent = indent_of(line);

        state = match state {
            ParserState::InOnBlock { indent: block }
            | ParserState::InWorkflowDispatchBlock {
                on_indent: block, ..
            }
            | ParserState::InJobsBlock { indent: block }
            | ParserState::InJobBody {
                jobs_indent: block,
                ..
            } if indent <= block => ParserState::Top,
            other => other,
        };

        state = match state {
            ParserState::Top => top_level_line(&mut descriptor, line, indent),
            ParserState::InOnBlock { indent: on_indent } => {
                on_block_line(&mut descriptor, line, indent, on_indent, None)
            }
            ParserState::InWorkflowDispatchBlock {
                on_indent,
                dispatch_indent,
            } => on_block_line(
                &mut descriptor,
                line,
                indent,
                on_indent,
                Some(dispatch_indent),
            ),
            ParserState::InJobsBlock { indent: jobs_indent } => {
                jobs_block_line(&mut descriptor, line, indent, jobs_indent, None)
            }
            ParserState::InJobBody {
                jobs_indent,
                job_index,
                job_indent,
            } => jobs_block_line(
                &mut descriptor,
                line,
                indent,
                jobs_indent,
                Some((job_index, job_indent)),
            ),
        };
    }

    debug!(
        events = ?descriptor.events,
        jobs = descriptor.jobs.len(),
        dispatch_inputs = descriptor.has_workflow_dispatch_inputs,
        "parsed workflow"
    );
    descriptor
}

fn top_level_line(descriptor: &mut WorkflowDescriptor, line: &str, indent: usize) -> ParserState {
    let p = patterns();

    if p.on_header.is_match(line) {
        return ParserState::InOnBlock { indent };
    }
    if let Some(caps) = p.on_inline.captures(line) {
        descriptor.events.extend(
            caps[1]
                .split(',')
                .map(trim_quotes)
                .filter(|item| !item.is_empty())
                .map(str::to_string),
        );
        return ParserState::Top;
    }
    if let Some(caps) = p.on_scalar.captures(line) {
        descriptor.events.insert(caps[1].to_string());
        return ParserState::Top;
    }
    if p.jobs_header.is_match(line) {
        return ParserState::InJobsBlock { indent };
    }
    ParserState::Top
}

fn on_block_line(
    descriptor: &mut WorkflowDescriptor,
    line: &str,
    indent: usize,
    on_indent: usize,
    dispatch_indent: Option<usize>,
) -> ParserState {
    let p = patterns();

    if indent == on_indent + 2 {
        if let Some(caps) = p.on_key.captures(line) {
            let event = &caps[1];
            descriptor.events.insert(event.to_string());
            if event == "workflow_dispatch" {
                return ParserState::InWorkflowDispatchBlock {
                    on_indent,
                    dispatch_indent: indent,
                };
            }
            return ParserState::InOnBlock { indent: on_indent };
        }
    }

    match dispatch_indent {
        Some(dispatch_indent) if indent > dispatch_indent => {
            if p.inputs.is_match(line) {
                descriptor.has_workflow_dispatch_inputs = true;
            }
            ParserState::InWorkflowDispatchBlock {
                on_indent,
                dispatch_indent,
            }
        }
        _ => ParserState::InOnBlock { indent: on_indent },
    }
}

fn jobs_block_line(
    descriptor: &mut WorkflowDescriptor,
    line: &str,
    indent: usize,
    jobs_indent: usize,
    current_job: Option<(usize, usize)>,
) -> ParserState {
    let p = patterns();

    if indent == jobs_indent + 2 {
        if let Some(caps) = p.job_header.captures(line) {
            let job_index = descriptor.record_job(&caps[1]);
            return ParserState::InJobBody {
                jobs_indent,
                job_index,
                job_indent: indent,
            };
        }
    }

    let Some((job_index, job_indent)) = current_job else {
        return ParserState::InJobsBlock { indent: jobs_indent };
    };

    if indent >= job_indent + 2 {
        if let Some(caps) = p.environment.captures(line) {
            descriptor.jobs[job_index].environment = Some(trim_quotes(&caps[1]).to_string());
        }
    }

    ParserState::InJobBody {
        jobs_indent,
        job_index,
        job_indent,
    }
}

/// Read and parse a workflow file. A missing file is an error.
pub fn parse_workflow_file(path: &Path) -> Result<WorkflowDescriptor> {
    if !path.exists() {
        return Err(HarnessError::WorkflowNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_workflow_str(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(descriptor: &WorkflowDescriptor) -> Vec<&str> {
        descriptor.events.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_inline_event_array() {
        let descriptor = parse_workflow_str("name: CI\non: [push, workflow_dispatch]\njobs:\n  build:\n    runs-on: ubuntu-latest\n");
        assert_eq!(events(&descriptor), vec!["push", "workflow_dispatch"]);
        assert!(!descriptor.has_workflow_dispatch_inputs);
        assert_eq!(
            descriptor.jobs,
            vec![WorkflowJob {
                id: "build".to_string(),
                environment: None
            }]
        );
    }

    #[test]
    fn test_inline_array_strips_quotes() {
        let descriptor = parse_workflow_str("on: ['push', \"pull_request\", ]\n");
        assert_eq!(events(&descriptor), vec!["pull_request", "push"]);
    }

    #[test]
    fn test_scalar_event() {
        let descriptor = parse_workflow_str("on: push\n");
        assert_eq!(events(&descriptor), vec!["push"]);
    }

    #[test]
    fn test_block_with_dispatch_inputs_and_environment() {
        let yaml = "\
name: Deploy
on:
  workflow_dispatch:
    inputs:
      foo:
        required: true
  push:
    branches: [main]
jobs:
  deploy:
    runs-on: ubuntu-latest
    environment: production
    steps:
      - run: echo hi
  check:
    runs-on: ubuntu-latest
";
        let descriptor = parse_workflow_str(yaml);
        assert_eq!(events(&descriptor), vec!["push", "workflow_dispatch"]);
        assert!(descriptor.has_workflow_dispatch_inputs);

        let mapping = descriptor.jobs_to_environment();
        assert_eq!(mapping.get("deploy"), Some(&Some("production".to_string())));
        assert_eq!(mapping.get("check"), Some(&None));
        assert_eq!(descriptor.jobs[0].id, "deploy");
        assert_eq!(descriptor.jobs[1].id, "check");
    }

    #[test]
    fn test_inputs_outside_dispatch_are_ignored() {
        let yaml = "\
on:
  workflow_dispatch:
  workflow_call:
    inputs:
      name:
        type: string
";
        let descriptor = parse_workflow_str(yaml);
        assert_eq!(events(&descriptor), vec!["workflow_call", "workflow_dispatch"]);
        assert!(!descriptor.has_workflow_dispatch_inputs);
    }

    #[test]
    fn test_jobs_header_closes_on_block() {
        let yaml = "on:\n  push:\njobs:\n  push:\n    runs-on: x\n";
        let descriptor = parse_workflow_str(yaml);
        assert_eq!(events(&descriptor), vec!["push"]);
        assert_eq!(descriptor.jobs.len(), 1);
    }

    #[test]
    fn test_comments_and_quoted_environment() {
        let yaml = "\
on: # triggers
  pull_request: # prs
jobs:
  preview:   # job
    environment: \"preview\" # quoted
  lint:
    environment: { name: staging }
";
        let descriptor = parse_workflow_str(yaml);
        assert_eq!(events(&descriptor), vec!["pull_request"]);
        let mapping = descriptor.jobs_to_environment();
        assert_eq!(mapping["preview"], Some("preview".to_string()));
        assert_eq!(mapping["lint"], None);
    }

    #[test]
    fn test_nested_environment_key_under_steps_still_counts() {
        let yaml = "jobs:\n  a:\n    steps:\n      - uses: x\n        with:\n          environment: staging\n";
        let descriptor = parse_workflow_str(yaml);
        assert_eq!(descriptor.jobs[0].environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_multiple_on_declarations_union() {
        let descriptor = parse_workflow_str("on: [push]\non:\n  schedule:\n    - cron: '0 0 * * *'\n");
        assert_eq!(events(&descriptor), vec!["push", "schedule"]);
    }

    #[test]
    fn test_empty_input() {
        let descriptor = parse_workflow_str("");
        assert!(descriptor.events.is_empty());
        assert!(descriptor.jobs.is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_workflow_file(&dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, HarnessError::WorkflowNotFound(_)));
    }
}
