//! Ordered deployment URL list for a single deploy.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alias::{compute_pr_preview_alias, compute_template_alias, TruncationRecord};

/// Everything needed to compute the URLs of one deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasBuildRequest {
    /// Triggered by a pull request event.
    pub is_pull_request: bool,
    /// Template for the PR preview alias (PRs only).
    pub pr_preview_domain: Option<String>,
    /// Alias templates, applied in order for non-PR deploys.
    pub alias_domains: Option<Vec<String>>,
    /// Canonical host returned by Vercel for this deploy.
    pub deployment_host: String,
    pub user: String,
    pub repository: String,
    pub branch: String,
    pub pr_number: Option<u64>,
    pub commit_sha: String,
}

/// Output of [`build_deployment_urls`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasBuildResult {
    /// Scheme-qualified URLs, aliases first, canonical host last.
    pub deployment_urls: Vec<String>,
    /// First entry of `deployment_urls`.
    pub preview_url: String,
    /// Bare aliases that need an explicit `vercel alias set`.
    pub aliases_to_assign: Vec<String>,
    /// Set when the preview alias had to be shortened.
    pub truncation: Option<TruncationRecord>,
}

impl AliasBuildResult {
    /// The canonical deployment URL (always the last entry).
    pub fn unique_url(&self) -> &str {
        self.deployment_urls
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Compute every URL a deployment will be reachable at.
///
/// PR deploys get at most one preview alias (subject to Vercel truncation);
/// other deploys get one alias per configured template, in order. The
/// canonical host is always appended last.
pub fn build_deployment_urls(request: &AliasBuildRequest) -> AliasBuildResult {
    let mut deployment_urls = Vec::new();
    let mut aliases_to_assign = Vec::new();
    let mut truncation = None;

    match (request.is_pull_request, &request.pr_preview_domain, &request.alias_domains) {
        (true, Some(template), _) => {
            let preview = compute_pr_preview_alias(
                template,
                &request.user,
                &request.repository,
                &request.branch,
                request.pr_number,
                &request.commit_sha,
            );
            deployment_urls.push(add_scheme(&preview.alias));
            aliases_to_assign.push(preview.alias);
            truncation = preview.truncation;
        }
        (false, _, Some(templates)) => {
            for template in templates {
                let alias = compute_template_alias(
                    template,
                    &request.user,
                    &request.repository,
                    &request.branch,
                    request.pr_number,
                    &request.commit_sha,
                );
                deployment_urls.push(add_scheme(&alias));
                aliases_to_assign.push(alias);
            }
        }
        _ => {}
    }

    deployment_urls.push(add_scheme(&request.deployment_host));
    let preview_url = deployment_urls[0].clone();

    debug!(urls = ?deployment_urls, "Computed deployment URLs");

    AliasBuildResult {
        deployment_urls,
        preview_url,
        aliases_to_assign,
        truncation,
    }
}

fn scheme_len(url: &str) -> Option<usize> {
    ["https://", "http://"].iter().find_map(|scheme| {
        url.get(..scheme.len())
            .filter(|head| head.eq_ignore_ascii_case(scheme))
            .map(|_| scheme.len())
    })
}

/// Prefix `https://` unless the URL already carries an http(s) scheme.
pub fn add_scheme(url: &str) -> String {
    if scheme_len(url).is_some() {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Strip a leading `http://` or `https://` (any case).
pub fn remove_scheme(url: &str) -> &str {
    match scheme_len(url) {
        Some(len) => &url[len..],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AliasBuildRequest {
        AliasBuildRequest {
            is_pull_request: true,
            pr_preview_domain: None,
            alias_domains: None,
            deployment_host: "my-deploy.vercel.app".to_string(),
            user: "webstackdev".to_string(),
            repository: "astro.webstackbuilders.com".to_string(),
            branch: "feature/test".to_string(),
            pr_number: Some(123),
            commit_sha: "abcdef0123456789".to_string(),
        }
    }

    #[test]
    fn test_scheme_helpers() {
        assert_eq!(add_scheme("example.com"), "https://example.com");
        assert_eq!(add_scheme("http://example.com"), "http://example.com");
        assert_eq!(add_scheme("HTTPS://example.com"), "HTTPS://example.com");
        assert_eq!(remove_scheme("https://example.com"), "example.com");
        assert_eq!(remove_scheme("HTTP://example.com/x"), "example.com/x");
        assert_eq!(remove_scheme("example.com"), "example.com");
        assert_eq!(add_scheme("ftp"), "https://ftp");
    }

    #[test]
    fn test_pr_without_preview_domain() {
        let result = build_deployment_urls(&request());
        assert!(result.aliases_to_assign.is_empty());
        assert_eq!(result.deployment_urls, vec!["https://my-deploy.vercel.app"]);
        assert_eq!(result.preview_url, "https://my-deploy.vercel.app");
        assert!(result.truncation.is_none());
    }

    #[test]
    fn test_pr_preview_alias_comes_first() {
        let req = AliasBuildRequest {
            pr_preview_domain: Some("{REPO}-{PR}.vercel.app".to_string()),
            pr_number: Some(42),
            ..request()
        };
        let result = build_deployment_urls(&req);

        assert_eq!(
            result.aliases_to_assign,
            vec!["astro-webstackbuilders-com-42.vercel.app"]
        );
        assert_eq!(
            result.deployment_urls,
            vec![
                "https://astro-webstackbuilders-com-42.vercel.app",
                "https://my-deploy.vercel.app",
            ]
        );
        assert_eq!(
            result.preview_url,
            "https://astro-webstackbuilders-com-42.vercel.app"
        );
        assert_eq!(result.unique_url(), "https://my-deploy.vercel.app");
    }

    #[test]
    fn test_pr_ignores_alias_domains() {
        let req = AliasBuildRequest {
            alias_domains: Some(vec!["{REPO}.example.com".to_string()]),
            ..request()
        };
        let result = build_deployment_urls(&req);
        assert!(result.aliases_to_assign.is_empty());
        assert_eq!(result.deployment_urls.len(), 1);
    }

    #[test]
    fn test_truncated_preview_keeps_order() {
        let long_prefix = "a".repeat(60);
        let req = AliasBuildRequest {
            pr_preview_domain: Some(format!("{long_prefix}.vercel.app")),
            pr_number: Some(1),
            ..request()
        };
        let result = build_deployment_urls(&req);

        let record = result.truncation.clone().expect("expected truncation");
        assert_eq!(record.original_prefix, long_prefix);
        assert!(record.truncated_alias.starts_with(&format!("{}-", "a".repeat(55))));
        assert!(record.truncated_alias.ends_with(".vercel.app"));

        assert_eq!(result.aliases_to_assign, vec![record.truncated_alias.clone()]);
        assert_eq!(
            result.deployment_urls[0],
            format!("https://{}", record.truncated_alias)
        );
        assert_eq!(
            result.deployment_urls.last().unwrap(),
            "https://my-deploy.vercel.app"
        );
    }

    #[test]
    fn test_non_pr_alias_domains_in_order() {
        let req = AliasBuildRequest {
            is_pull_request: false,
            alias_domains: Some(vec![
                "{REPO}.example.com".to_string(),
                "{REPO}-{SHA}.example.com".to_string(),
            ]),
            deployment_host: "my-prod.vercel.app".to_string(),
            branch: "main".to_string(),
            pr_number: None,
            ..request()
        };
        let result = build_deployment_urls(&req);

        assert_eq!(
            result.aliases_to_assign,
            vec![
                "astro-webstackbuilders-com.example.com",
                "astro-webstackbuilders-com-abcdef0.example.com",
            ]
        );
        assert_eq!(
            result.deployment_urls,
            vec![
                "https://astro-webstackbuilders-com.example.com",
                "https://astro-webstackbuilders-com-abcdef0.example.com",
                "https://my-prod.vercel.app",
            ]
        );
        assert_eq!(
            result.preview_url,
            "https://astro-webstackbuilders-com.example.com"
        );
    }

    #[test]
    fn test_non_pr_long_alias_is_not_truncated() {
        let req = AliasBuildRequest {
            is_pull_request: false,
            alias_domains: Some(vec![format!("{}.vercel.app", "c".repeat(70))]),
            ..request()
        };
        let result = build_deployment_urls(&req);
        assert_eq!(result.aliases_to_assign[0], format!("{}.vercel.app", "c".repeat(70)));
        assert!(result.truncation.is_none());
    }

    #[test]
    fn test_canonical_host_always_last() {
        for is_pr in [true, false] {
            for preview in [None, Some("{BRANCH}.vercel.app".to_string())] {
                for aliases in [None, Some(vec!["{USER}.example.com".to_string()])] {
                    let req = AliasBuildRequest {
                        is_pull_request: is_pr,
                        pr_preview_domain: preview.clone(),
                        alias_domains: aliases.clone(),
                        deployment_host: "https://canonical.vercel.app".to_string(),
                        ..request()
                    };
                    let result = build_deployment_urls(&req);
                    assert_eq!(
                        result.deployment_urls.last().map(String::as_str),
                        Some("https://canonical.vercel.app")
                    );
                    assert_eq!(result.preview_url, result.deployment_urls[0]);
                    assert_eq!(
                        result.deployment_urls.len(),
                        result.aliases_to_assign.len() + 1
                    );
                }
            }
        }
    }
}
