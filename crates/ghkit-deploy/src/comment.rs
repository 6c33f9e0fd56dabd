//! Preview-ready PR comment for `workflow_run` events.

use std::path::Path;

use ghkit_core::actor::{actor_markdown, Actor};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::{DeployError, Result};

/// Hidden marker used to find and update an existing preview comment.
pub const COMMENT_TAG: &str = "<!-- vercel-preview-card -->";

/// Subset of the `workflow_run` event payload used for the comment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowRunPayload {
    pub workflow_run: Option<WorkflowRun>,
    pub repository: Option<PayloadRepository>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowRun {
    pub head_branch: Option<String>,
    pub head_sha: Option<String>,
    pub actor: Option<Actor>,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_requests: Vec<PullRequestRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PullRequestRef {
    #[serde(deserialize_with = "null_as_default")]
    pub number: u64,
}

/// Treat an explicit JSON `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayloadRepository {
    pub owner: Option<PayloadOwner>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayloadOwner {
    pub login: Option<String>,
}

impl WorkflowRunPayload {
    /// Read the payload from `GITHUB_EVENT_PATH`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// True for URLs on Vercel-managed domains.
pub fn is_vercel_url(value: &str) -> bool {
    value.contains("vercel.app") || value.contains("vercel.com")
}

/// Everything rendered into the preview comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewComment {
    pub pr_number: u64,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub sha: String,
    pub preview_url: String,
    pub triggered_by: String,
}

impl PreviewComment {
    /// Collect comment fields from a payload.
    ///
    /// Returns `Ok(None)` (after a warning) when there is nothing to comment
    /// on: no associated PR, or a preview URL that is not a Vercel URL.
    /// Missing repository metadata is an error.
    pub fn from_payload(
        payload: &WorkflowRunPayload,
        preview_url: &str,
        actor_fallback: &str,
    ) -> Result<Option<Self>> {
        let run = payload.workflow_run.clone().unwrap_or_default();

        let Some(pr) = run.pull_requests.first().filter(|pr| pr.number != 0) else {
            warn!("Missing pull request metadata, skipping preview success comment");
            return Ok(None);
        };

        let repository = payload.repository.clone().unwrap_or_default();
        let owner = repository.owner.and_then(|o| o.login);
        let (Some(owner), Some(repo)) = (owner, repository.name) else {
            return Err(DeployError::MissingPayloadField(
                "repository owner/name".to_string(),
            ));
        };

        if !is_vercel_url(preview_url) {
            warn!(preview_url = %preview_url, "Unable to resolve Vercel preview URL, skipping preview success comment");
            return Ok(None);
        }

        Ok(Some(PreviewComment {
            pr_number: pr.number,
            owner,
            repo,
            branch: run
                .head_branch
                .unwrap_or_else(|| "unknown-branch".to_string()),
            sha: run.head_sha.unwrap_or_default(),
            preview_url: preview_url.to_string(),
            triggered_by: actor_markdown(run.actor.as_ref(), actor_fallback),
        }))
    }

    /// Render the markdown body.
    pub fn body(&self) -> String {
        build_preview_comment_body(self)
    }
}

/// Render the preview-ready comment body.
pub fn build_preview_comment_body(comment: &PreviewComment) -> String {
    let short_sha = if comment.sha.is_empty() {
        "unknown".to_string()
    } else {
        comment.sha.chars().take(7).collect()
    };
    let commit_url = if comment.sha.is_empty() {
        format!("https://github.com/{}/{}", comment.owner, comment.repo)
    } else {
        format!(
            "https://github.com/{}/{}/commit/{}",
            comment.owner, comment.repo, comment.sha
        )
    };

    [
        COMMENT_TAG.to_string(),
        "✅ **Preview deployment ready**".to_string(),
        String::new(),
        "| Field | Value |".to_string(),
        "| --- | --- |".to_string(),
        format!("| Branch | `{}` |", comment.branch),
        format!("| Commit | [{short_sha}]({commit_url}) |"),
        format!(
            "| Preview | <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Open preview</a> |",
            comment.preview_url
        ),
        String::new(),
        format!("_Triggered by {}_", comment.triggered_by),
    ]
    .join("\n")
}

/// Inputs for the "deployed to Vercel" comment posted by the deploy step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentComment {
    pub sha: String,
    pub preview_url: String,
    pub inspector_url: String,
    pub log_url: String,
}

/// Render the deployment summary comment body.
pub fn build_deployment_comment_body(comment: &DeploymentComment) -> String {
    let short_sha: String = comment.sha.chars().take(7).collect();
    [
        "This pull request has been deployed to Vercel.".to_string(),
        String::new(),
        "<table>".to_string(),
        "<tr>".to_string(),
        "<td><strong>Latest commit:</strong></td>".to_string(),
        format!("<td><code>{short_sha}</code></td>"),
        "</tr>".to_string(),
        "<tr>".to_string(),
        "<td><strong>✅ Preview:</strong></td>".to_string(),
        format!(
            "<td><a href='{url}'>{url}</a></td>",
            url = comment.preview_url
        ),
        "</tr>".to_string(),
        "<tr>".to_string(),
        "<td><strong>🔍 Inspect:</strong></td>".to_string(),
        format!(
            "<td><a href='{url}'>{url}</a></td>",
            url = comment.inspector_url
        ),
        "</tr>".to_string(),
        "</table>".to_string(),
        String::new(),
        format!("[View Workflow Logs]({})", comment.log_url),
    ]
    .join("\n")
}

/// Render the comment explaining why a fork PR was not deployed.
pub fn build_fork_refusal_comment_body(actor: &str, user: &str) -> String {
    format!(
        "Refusing to deploy this Pull Request to Vercel because it originates from @{actor}'s fork.\n\n\
         **@{user}** To allow this behaviour set `DEPLOY_PR_FROM_FORK` to true."
    )
}
