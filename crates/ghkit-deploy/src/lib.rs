//! ghkit deploy - deployment URL and alias computation
//!
//! Turns a deployment context (repository, branch, commit, PR number and
//! user-supplied domain templates) into the ordered list of URLs a Vercel
//! deployment is reachable at, applying Vercel's alias-length truncation
//! rule for long preview aliases.
//!
//! The Vercel CLI and the GitHub API are not driven from here; callers get
//! the aliases to assign and the URLs to report, and do the I/O themselves.

pub mod alias;
pub mod comment;
pub mod context;
pub mod error;
pub mod host;
pub mod search_scope;
pub mod urls;

pub use alias::{
    compute_pr_preview_alias, compute_template_alias, url_safe_parameter, PreviewAlias,
    TruncationRecord,
};
pub use comment::{
    build_deployment_comment_body, build_fork_refusal_comment_body, build_preview_comment_body,
    is_vercel_url, DeploymentComment, PreviewComment, WorkflowRunPayload,
};
pub use context::DeployContext;
pub use error::{DeployError, Result};
pub use host::parse_deployment_host;
pub use search_scope::{
    content_file_to_url_path, determine_crawl_scope, removed_document_ids, ChangedFile,
    Collection, CrawlScope,
};
pub use urls::{add_scheme, build_deployment_urls, remove_scheme, AliasBuildRequest, AliasBuildResult};
