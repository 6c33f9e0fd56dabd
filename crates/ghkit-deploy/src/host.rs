//! Deployment host extraction from `vercel deploy` output.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{DeployError, Result};

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("static URL pattern"))
}

/// Pull the deployment host out of the Vercel CLI's textual output.
///
/// The CLI prints inspector and preview URLs; the last one is the deployment
/// itself. Returns the URL's authority (`host[:port]`), without scheme or path.
pub fn parse_deployment_host(cli_output: &str) -> Result<String> {
    let last = url_pattern()
        .find_iter(cli_output)
        .last()
        .ok_or(DeployError::DeploymentUrlNotFound)?;

    let url = last.as_str();
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = rest
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    if host.is_empty() {
        return Err(DeployError::DeploymentUrlNotFound);
    }
    Ok(host.to_string())
}
