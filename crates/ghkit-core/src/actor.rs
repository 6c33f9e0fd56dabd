//! The `actor` field of workflow-run payloads.
//!
//! GitHub sends either a bare login string or a user object, depending on
//! the event and API version. Both shapes deserialize into [`Actor`].

use serde::{Deserialize, Serialize};

/// Fallback shown when neither the payload nor the environment names an actor.
pub const DEFAULT_ACTOR: &str = "workflow_run";

/// Who triggered a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Actor {
    /// Bare login string.
    PlainName(String),
    /// User object with an optional profile URL.
    NamedWithProfile {
        #[serde(default)]
        login: Option<String>,
        #[serde(default, rename = "html_url")]
        url: Option<String>,
    },
}

impl Actor {
    /// Login name, if the payload carried one.
    pub fn login(&self) -> Option<&str> {
        let login = match self {
            Actor::PlainName(name) => Some(name.as_str()),
            Actor::NamedWithProfile { login, .. } => login.as_deref(),
        };
        login.filter(|login| !login.trim().is_empty())
    }

    /// Profile link. Plain names never get one; user objects fall back to
    /// `https://github.com/<login>` when `html_url` is absent.
    pub fn profile_url(&self) -> Option<String> {
        match self {
            Actor::PlainName(_) => None,
            Actor::NamedWithProfile { url, .. } => url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .map(str::to_string)
                .or_else(|| self.login().map(|l| format!("https://github.com/{l}"))),
        }
    }
}

/// Render the "triggered by" mention used in PR comments.
///
/// Produces `@login` or `[@login](profile)`; `fallback` stands in when the
/// actor is missing or has no login.
pub fn actor_markdown(actor: Option<&Actor>, fallback: &str) -> String {
    let fallback = if fallback.trim().is_empty() {
        DEFAULT_ACTOR
    } else {
        fallback.trim()
    };
    let name = actor.and_then(Actor::login).unwrap_or(fallback);
    let display = if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{name}")
    };

    match actor.and_then(Actor::profile_url) {
        Some(link) => format!("[{display}]({link})"),
        None => display,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_both_shapes() {
        let plain: Actor = serde_json::from_str("\"octocat\"").unwrap();
        assert_eq!(plain, Actor::PlainName("octocat".to_string()));

        let object: Actor =
            serde_json::from_str(r#"{"login":"octocat","html_url":"https://github.com/octocat"}"#)
                .unwrap();
        assert_eq!(
            object,
            Actor::NamedWithProfile {
                login: Some("octocat".to_string()),
                url: Some("https://github.com/octocat".to_string()),
            }
        );

        let empty: Actor = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.login(), None);
    }

    #[test]
    fn test_markdown_plain_name_has_no_link() {
        let actor = Actor::PlainName("octocat".to_string());
        assert_eq!(actor_markdown(Some(&actor), "ignored"), "@octocat");
    }

    #[test]
    fn test_markdown_profile_links() {
        let actor = Actor::NamedWithProfile {
            login: Some("octocat".to_string()),
            url: None,
        };
        assert_eq!(
            actor_markdown(Some(&actor), "x"),
            "[@octocat](https://github.com/octocat)"
        );

        let actor = Actor::NamedWithProfile {
            login: Some("octocat".to_string()),
            url: Some("https://example.com/me".to_string()),
        };
        assert_eq!(
            actor_markdown(Some(&actor), "x"),
            "[@octocat](https://example.com/me)"
        );
    }

    #[test]
    fn test_markdown_fallbacks() {
        assert_eq!(actor_markdown(None, "deploy-bot"), "@deploy-bot");
        assert_eq!(actor_markdown(None, "@already"), "@already");
        assert_eq!(actor_markdown(None, "  "), "@workflow_run");
    }
}
