//! Shell-style `KEY=value` files and the GitHub token heuristic.
//!
//! Accepted syntax per line: blank lines and `#` comments are ignored, an
//! optional `export ` prefix is dropped, values may be single- or
//! double-quoted, and a stray doubled `=` (`KEY==value`) is tolerated.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;

/// Parse `KEY=value` content. Later keys win.
pub fn parse_key_value_str(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = value.trim();
        let value = value.strip_prefix('=').map(str::trim_start).unwrap_or(value);
        values.insert(key.to_string(), unquote(value));
    }

    values
}

/// Parse a `KEY=value` file; a missing file is an empty map.
pub fn parse_key_value_file(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_key_value_str(&content))
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        let Some(inner) = value.strip_prefix(quote) else {
            continue;
        };
        // Anything after the closing quote (usually ` # comment`) is dropped.
        if let Some(end) = inner.find(quote) {
            return inner[..end].to_string();
        }
    }
    // Unquoted values may carry a trailing ` # comment`.
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}

fn prefixed_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^gh[pousr]_[A-Za-z0-9_]+$").expect("static token pattern"))
}

fn token_charset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("static charset pattern"))
}

/// Best-effort check that a value could be a GitHub token.
///
/// Placeholders like `changeme` or `<your token>` are rejected so they never
/// reach `act`, which would otherwise attempt authenticated clones with them.
pub fn looks_like_token(value: &str) -> bool {
    let token = value.trim();
    if token.chars().count() < 20 || token.chars().any(char::is_whitespace) {
        return false;
    }
    if token.starts_with("github_pat_") || prefixed_token_pattern().is_match(token) {
        return true;
    }
    token_charset_pattern().is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comments_export_and_quotes() {
        let content = "# shared\n\
            export FOO=bar\n\
            QUOTED=\"hello world\"\n\
            SINGLE='x y'\n\
            \n\
            DOUBLED==value\n\
            INLINE=abc # trailing\n\
            =novalue\n\
            garbage line\n";
        let values = parse_key_value_str(content);

        assert_eq!(values.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(values.get("QUOTED").map(String::as_str), Some("hello world"));
        assert_eq!(values.get("SINGLE").map(String::as_str), Some("x y"));
        assert_eq!(values.get("DOUBLED").map(String::as_str), Some("value"));
        assert_eq!(values.get("INLINE").map(String::as_str), Some("abc"));
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn test_quoted_hash_is_kept() {
        let values = parse_key_value_str("PASSWORD=\"a #b\"\n");
        assert_eq!(values["PASSWORD"], "a #b");
    }

    #[test]
    fn test_quoted_value_with_trailing_comment() {
        let values = parse_key_value_str(
            "TOKEN=\"abc\" # note\nSINGLE='x y'   # other\nOPEN=\"unterminated # c\n",
        );
        assert_eq!(values["TOKEN"], "abc");
        assert_eq!(values["SINGLE"], "x y");
        assert_eq!(values["OPEN"], "\"unterminated");
    }

    #[test]
    fn test_commented_shared_token_still_looks_like_token() {
        let token = format!("ghp_{}", "A1b2".repeat(9));
        let values = parse_key_value_str(&format!("GITHUB_TOKEN=\"{token}\" # my PAT\n"));
        assert_eq!(values["GITHUB_TOKEN"], token);
        assert!(looks_like_token(&values["GITHUB_TOKEN"]));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let values = parse_key_value_file(&dir.path().join("nope.env")).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_token_heuristic() {
        assert!(looks_like_token(&format!("github_pat_{}", "a".repeat(40))));
        assert!(looks_like_token(&format!("ghp_{}", "A1b2".repeat(9))));
        assert!(looks_like_token("0123456789abcdef0123456789abcdef01234567"));
        assert!(looks_like_token("  ghs_abcdefghijklmnopqrstuvwxyz  "));

        assert!(!looks_like_token("short"));
        assert!(!looks_like_token("ghp_1234567890123"));
        assert!(!looks_like_token("not a real token at all, clearly"));
        assert!(!looks_like_token(&format!("github_pat_{}\t{}", "a".repeat(20), "b".repeat(20))));
        assert!(!looks_like_token("<paste-your-token-here>"));
    }

    #[test]
    fn test_pipe_is_not_a_token_prefix() {
        assert!(!looks_like_token(&format!("gh|_{}", "A1b2".repeat(9))));
        assert!(looks_like_token(&format!("ghr_{}", "A1b2".repeat(9))));
    }
}
