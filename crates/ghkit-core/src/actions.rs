//! GitHub Actions workflow commands and step outputs.
//!
//! The runner scans a step's stdout for `::command::value` lines, so these
//! helpers print to stdout directly instead of going through `tracing`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Render a workflow command line, e.g. `::warning::disk almost full`.
pub fn command_line(command: &str, value: &str) -> String {
    format!("::{command}::{value}")
}

/// Emit a `::debug::` line (only shown when step debug logging is on).
pub fn debug(message: &str) {
    println!("{}", command_line("debug", message));
}

/// Emit a `::warning::` annotation.
pub fn warning(message: &str) {
    println!("{}", command_line("warning", message));
}

/// Emit an `::error::` annotation.
pub fn error(message: &str) {
    println!("{}", command_line("error", message));
}

/// Ask the runner to mask `value` in all subsequent log output.
///
/// Blank values are skipped; masking whitespace would garble the log.
pub fn add_mask(value: &str) {
    if let Some(line) = mask_line(value) {
        println!("{line}");
    }
}

fn mask_line(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(command_line("add-mask", value))
    }
}

/// Set a step output.
///
/// Appends `name=value` to the file named by `GITHUB_OUTPUT`. Older runners
/// without that variable get the deprecated `::set-output` command instead.
pub fn set_output(name: &str, value: &str) -> std::io::Result<()> {
    match std::env::var("GITHUB_OUTPUT") {
        Ok(path) if !path.trim().is_empty() => append_output(Path::new(path.trim()), name, value),
        _ => {
            println!("::set-output name={name}::{value}");
            Ok(())
        }
    }
}

/// Append one `name=value` line to a `GITHUB_OUTPUT` style file.
pub fn append_output(path: &Path, name: &str, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{name}={value}")
}

/// Report a failure the way every ghkit step does and exit non-zero.
pub fn set_failed(message: &str) -> ! {
    error(message);
    std::process::exit(1)
}
