//! Alias template substitution and Vercel's preview alias truncation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// Suffix of Vercel-managed preview hosts.
pub const VERCEL_PREVIEW_SUFFIX: &str = ".vercel.app";

/// Prefixes at or above this length get truncated by Vercel.
pub const ALIAS_PREFIX_LIMIT: usize = 60;

/// Characters of the original prefix kept after truncation.
pub const TRUNCATED_PREFIX_LEN: usize = 55;

/// Hex characters of the uniqueness hash appended after truncation.
pub const UNIQUE_SUFFIX_LEN: usize = 6;

/// Replace every character outside `[A-Za-z0-9_~]` with `-`.
pub fn url_safe_parameter(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '~' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Substitute `{USER}`, `{REPO}`, `{BRANCH}`, `{PR}` and `{SHA}` in a domain
/// template and lower-case the result.
///
/// Unknown or malformed placeholders pass through untouched.
pub fn compute_template_alias(
    template: &str,
    user: &str,
    repository: &str,
    branch: &str,
    pr_number: Option<u64>,
    sha: &str,
) -> String {
    let pr = pr_number
        .filter(|n| *n != 0)
        .map(|n| n.to_string())
        .unwrap_or_default();
    let short_sha: String = sha.chars().take(7).collect();

    template
        .replace("{USER}", &url_safe_parameter(user))
        .replace("{REPO}", &url_safe_parameter(repository))
        .replace("{BRANCH}", &url_safe_parameter(branch))
        .replace("{PR}", &pr)
        .replace("{SHA}", &short_sha)
        .to_lowercase()
}

/// Original and replacement of a truncated preview alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationRecord {
    /// Alias prefix (before `.vercel.app`) as computed from the template.
    pub original_prefix: String,
    /// Full alias after truncation, suffix included.
    pub truncated_alias: String,
}

/// A computed PR preview alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewAlias {
    /// Bare host to assign, no scheme.
    pub alias: String,
    /// Present only when Vercel's length rule kicked in.
    pub truncation: Option<TruncationRecord>,
}

/// Compute the alias for a PR preview domain template.
///
/// Long `*.vercel.app` aliases are shortened exactly the way Vercel shortens
/// its own branch aliases: first 55 characters of the prefix, a dash, and the
/// first 6 hex digits of `sha256("git-{branch}-{repository}")`.
pub fn compute_pr_preview_alias(
    template: &str,
    user: &str,
    repository: &str,
    branch: &str,
    pr_number: Option<u64>,
    sha: &str,
) -> PreviewAlias {
    let alias = compute_template_alias(template, user, repository, branch, pr_number, sha);

    if !alias.ends_with(VERCEL_PREVIEW_SUFFIX) {
        return PreviewAlias {
            alias,
            truncation: None,
        };
    }

    // First occurrence, matching how Vercel splits the host.
    let split = alias.find(VERCEL_PREVIEW_SUFFIX).unwrap_or(alias.len());
    let prefix = &alias[..split];
    if prefix.chars().count() < ALIAS_PREFIX_LIMIT {
        return PreviewAlias {
            alias,
            truncation: None,
        };
    }

    warn!(
        prefix = %prefix,
        "The alias exceeds {} chars in length, truncating using vercel's rules",
        ALIAS_PREFIX_LIMIT
    );

    let truncated: String = prefix.chars().take(TRUNCATED_PREFIX_LEN).collect();
    let unique_suffix = unique_alias_suffix(branch, repository);
    let next_alias = format!("{truncated}-{unique_suffix}{VERCEL_PREVIEW_SUFFIX}");

    info!(alias = %next_alias, "Updated domain alias");

    PreviewAlias {
        truncation: Some(TruncationRecord {
            original_prefix: prefix.to_string(),
            truncated_alias: next_alias.clone(),
        }),
        alias: next_alias,
    }
}

/// First hex digits of `sha256("git-{branch}-{repository}")`.
fn unique_alias_suffix(branch: &str, repository: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("git-{branch}-{repository}").as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..UNIQUE_SUFFIX_LEN].to_string()
}
