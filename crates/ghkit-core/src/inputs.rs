//! Action inputs and runner environment lookups.
//!
//! Composite actions map their `inputs:` to `INPUT_<NAME>` environment
//! variables. [`Inputs`] wraps a snapshot of the environment so lookups are
//! testable without touching the real process environment.

use std::collections::HashMap;

use crate::error::{InputError, Result};

/// Snapshot of environment variables used to resolve action inputs.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    vars: HashMap<String, String>,
}

impl Inputs {
    /// Capture the current process environment.
    pub fn from_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from an explicit set of variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Trimmed value of an environment variable, `None` when unset or blank.
    pub fn env(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed value of the `INPUT_<NAME>` variable for an action input.
    pub fn input(&self, name: &str) -> Option<&str> {
        self.env(&format!("INPUT_{}", name.to_uppercase()))
    }

    /// Like [`Inputs::env`] but missing values are an error.
    pub fn require_env(&self, name: &str) -> Result<&str> {
        self.env(name)
            .ok_or_else(|| InputError::MissingEnv(name.to_string()))
    }

    /// Like [`Inputs::input`] but missing values are an error.
    pub fn require_input(&self, name: &str) -> Result<&str> {
        self.input(name)
            .ok_or_else(|| InputError::MissingInput(name.to_string()))
    }
}

/// Parse a boolean-ish input. Unrecognised or blank values yield `default`.
pub fn parse_bool(value: &str, default: bool) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return default;
    }
    match trimmed.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => true,
        "false" | "0" | "no" | "n" | "off" => false,
        _ => default,
    }
}

/// Parse a newline-separated list input that can be switched off.
///
/// Blank input yields `default`; `false`, `0`, `no` or `off` disable the
/// list entirely (`None`).
pub fn parse_disableable_list(value: &str, default: Option<Vec<String>>) -> Option<Vec<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return default;
    }
    if matches!(
        trimmed.to_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    ) {
        return None;
    }
    Some(non_empty_lines(trimmed))
}

/// Parse a newline-separated list input; `None` when nothing is listed.
pub fn parse_list(value: &str) -> Option<Vec<String>> {
    let lines = non_empty_lines(value);
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

fn non_empty_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
