//! Deploy context resolved from the GitHub Actions runner environment.

use std::path::Path;

use ghkit_core::inputs::{parse_disableable_list, Inputs};
use ghkit_core::InputError;
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::urls::AliasBuildRequest;

/// Placeholder commit SHA used when the runner does not provide one.
pub const UNKNOWN_SHA: &str = "XXXXXXX";

/// Repository, ref and alias configuration for one deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContext {
    pub user: String,
    pub repository: String,
    pub branch: String,
    pub git_ref: String,
    pub sha: String,
    pub pr_number: Option<u64>,
    pub is_pr: bool,
    /// PR head lives in a different repository.
    pub is_fork: bool,
    pub actor: String,
    pub alias_domains: Option<Vec<String>>,
    pub pr_preview_domain: Option<String>,
    /// Workflow run page, or the repository page outside a run.
    pub log_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PullRequestEvent {
    number: Option<u64>,
    pull_request: Option<PullRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PullRequest {
    head: Option<PullRequestHead>,
    user: Option<Login>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PullRequestHead {
    sha: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    repo: Option<HeadRepository>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HeadRepository {
    full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Login {
    login: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the event payload; unreadable payloads count as empty.
fn load_event_payload(path: Option<&str>) -> PullRequestEvent {
    let Some(path) = path else {
        return PullRequestEvent::default();
    };
    match std::fs::read_to_string(Path::new(path)) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            debug!(path = %path, error = %err, "Ignoring unparsable event payload");
            PullRequestEvent::default()
        }),
        Err(err) => {
            debug!(path = %path, error = %err, "Ignoring unreadable event payload");
            PullRequestEvent::default()
        }
    }
}

impl DeployContext {
    /// Resolve the context from `GITHUB_*` variables, the event payload and
    /// the `ALIAS_DOMAINS` / `PR_PREVIEW_DOMAIN` inputs.
    pub fn from_inputs(inputs: &Inputs) -> Result<Self> {
        let github_repository = inputs.require_env("GITHUB_REPOSITORY")?;
        let (user, repository) =
            github_repository
                .split_once('/')
                .ok_or_else(|| InputError::Malformed {
                    name: "GITHUB_REPOSITORY".to_string(),
                    reason: "expected 'owner/repo'".to_string(),
                })?;

        let event_name = inputs.env("GITHUB_EVENT_NAME").unwrap_or_default();
        let is_pr = matches!(event_name, "pull_request" | "pull_request_target");

        let alias_domains = parse_disableable_list(inputs.input("ALIAS_DOMAINS").unwrap_or_default(), None);
        let pr_preview_domain = inputs.input("PR_PREVIEW_DOMAIN").map(str::to_string);

        let log_url = match inputs.env("GITHUB_RUN_ID") {
            Some(run_id) => format!("https://github.com/{github_repository}/actions/runs/{run_id}"),
            None => format!("https://github.com/{github_repository}"),
        };

        let mut context = DeployContext {
            user: user.to_string(),
            repository: repository.to_string(),
            branch: String::new(),
            git_ref: String::new(),
            sha: UNKNOWN_SHA.to_string(),
            pr_number: None,
            is_pr,
            is_fork: false,
            actor: user.to_string(),
            alias_domains,
            pr_preview_domain,
            log_url,
        };

        if is_pr {
            context.apply_pull_request(
                load_event_payload(inputs.env("GITHUB_EVENT_PATH")),
                github_repository,
            );
        } else {
            context.apply_push(inputs);
        }

        debug!(
            repository = %github_repository,
            branch = %context.branch,
            pr = ?context.pr_number,
            is_fork = context.is_fork,
            "Resolved deploy context"
        );
        Ok(context)
    }

    fn apply_pull_request(&mut self, payload: PullRequestEvent, github_repository: &str) {
        let pr = payload.pull_request.unwrap_or_default();
        let head = pr.head.unwrap_or_default();

        self.pr_number = payload.number.filter(|n| *n != 0);
        if let Some(sha) = non_blank(head.sha) {
            self.sha = sha;
        }
        self.branch = non_blank(head.git_ref).unwrap_or_default();
        self.git_ref = self.branch.clone();
        if let Some(login) = non_blank(pr.user.and_then(|u| u.login)) {
            self.actor = login;
        }

        let head_repo = non_blank(head.repo.and_then(|r| r.full_name));
        self.is_fork = head_repo.is_some_and(|name| name != github_repository);
    }

    fn apply_push(&mut self, inputs: &Inputs) {
        if let Some(actor) = inputs.env("GITHUB_ACTOR") {
            self.actor = actor.to_string();
        }
        if let Some(sha) = inputs.env("GITHUB_SHA") {
            self.sha = sha.to_string();
        }
        self.git_ref = inputs.env("GITHUB_REF").unwrap_or_default().to_string();
        self.branch = self
            .git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref)
            .to_string();
    }

    /// Build the alias request for a finished deploy.
    pub fn to_alias_request(&self, deployment_host: &str) -> AliasBuildRequest {
        AliasBuildRequest {
            is_pull_request: self.is_pr,
            pr_preview_domain: self.pr_preview_domain.clone(),
            alias_domains: self.alias_domains.clone(),
            deployment_host: deployment_host.to_string(),
            user: self.user.clone(),
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            pr_number: self.pr_number,
            commit_sha: self.sha.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pull_request_context() {
        let dir = tempfile::tempdir().unwrap();
        let event_path = dir.path().join("event.json");
        let payload = json!({
            "number": 7,
            "pull_request": {
                "head": {
                    "sha": "abc123",
                    "ref": "feature/one",
                    "repo": {"full_name": "someone/fork"}
                },
                "user": {"login": "forker"}
            }
        });
        std::fs::write(&event_path, payload.to_string()).unwrap();

        let inputs = Inputs::from_vars([
            ("GITHUB_REPOSITORY", "webstackdev/astro.webstackbuilders.com".to_string()),
            ("GITHUB_EVENT_NAME", "pull_request".to_string()),
            ("GITHUB_EVENT_PATH", event_path.display().to_string()),
            ("INPUT_PR_PREVIEW_DOMAIN", "{REPO}-{PR}.vercel.app".to_string()),
        ]);

        let ctx = DeployContext::from_inputs(&inputs).unwrap();
        assert!(ctx.is_pr);
        assert_eq!(ctx.pr_number, Some(7));
        assert_eq!(ctx.branch, "feature/one");
        assert_eq!(ctx.git_ref, "feature/one");
        assert_eq!(ctx.sha, "abc123");
        assert_eq!(ctx.actor, "forker");
        assert!(ctx.is_fork);
        assert_eq!(ctx.user, "webstackdev");
        assert_eq!(ctx.repository, "astro.webstackbuilders.com");

        let request = ctx.to_alias_request("my-deploy.vercel.app");
        assert_eq!(request.pr_preview_domain.as_deref(), Some("{REPO}-{PR}.vercel.app"));
        assert_eq!(request.pr_number, Some(7));
    }

    #[test]
    fn test_push_context() {
        let inputs = Inputs::from_vars([
            ("GITHUB_REPOSITORY", "acme/site"),
            ("GITHUB_EVENT_NAME", "push"),
            ("GITHUB_REF", "refs/heads/main"),
            ("GITHUB_SHA", "0123456789abcdef"),
            ("GITHUB_ACTOR", "pusher"),
            ("INPUT_ALIAS_DOMAINS", "{REPO}.example.com\n\nwww.example.com\n"),
        ]);

        let ctx = DeployContext::from_inputs(&inputs).unwrap();
        assert!(!ctx.is_pr);
        assert!(!ctx.is_fork);
        assert_eq!(ctx.branch, "main");
        assert_eq!(ctx.git_ref, "refs/heads/main");
        assert_eq!(ctx.actor, "pusher");
        assert_eq!(
            ctx.alias_domains,
            Some(vec!["{REPO}.example.com".to_string(), "www.example.com".to_string()])
        );
    }

    #[test]
    fn test_missing_payload_and_sha_defaults() {
        let inputs = Inputs::from_vars([
            ("GITHUB_REPOSITORY", "acme/site"),
            ("GITHUB_EVENT_NAME", "pull_request_target"),
            ("GITHUB_EVENT_PATH", "/nonexistent/event.json"),
        ]);

        let ctx = DeployContext::from_inputs(&inputs).unwrap();
        assert!(ctx.is_pr);
        assert_eq!(ctx.sha, UNKNOWN_SHA);
        assert_eq!(ctx.pr_number, None);
        assert_eq!(ctx.actor, "acme");
        assert!(!ctx.is_fork);
    }

    #[test]
    fn test_log_url_with_and_without_run_id() {
        let with_run = Inputs::from_vars([
            ("GITHUB_REPOSITORY", "acme/site"),
            ("GITHUB_RUN_ID", "987654"),
        ]);
        assert_eq!(
            DeployContext::from_inputs(&with_run).unwrap().log_url,
            "https://github.com/acme/site/actions/runs/987654"
        );

        let without_run = Inputs::from_vars([("GITHUB_REPOSITORY", "acme/site")]);
        assert_eq!(
            DeployContext::from_inputs(&without_run).unwrap().log_url,
            "https://github.com/acme/site"
        );
    }

    #[test]
    fn test_disabled_alias_domains() {
        let inputs = Inputs::from_vars([
            ("GITHUB_REPOSITORY", "acme/site"),
            ("INPUT_ALIAS_DOMAINS", "false"),
        ]);
        let ctx = DeployContext::from_inputs(&inputs).unwrap();
        assert_eq!(ctx.alias_domains, None);
    }

    #[test]
    fn test_malformed_repository_slug() {
        let inputs = Inputs::from_vars([("GITHUB_REPOSITORY", "no-slash")]);
        let err = DeployContext::from_inputs(&inputs).unwrap_err();
        assert!(err.to_string().contains("GITHUB_REPOSITORY"));
    }
}
