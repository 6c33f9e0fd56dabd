//! ghkit core - shared plumbing for GitHub Actions steps
//!
//! Everything the deploy helpers and the local replay harness have in
//! common lives here:
//!
//! - [`telemetry`]: one-shot tracing subscriber setup for the binaries
//! - [`actions`]: workflow commands (`::warning::`, `::error::`, ...) and step outputs
//! - [`inputs`]: `INPUT_*` / environment lookups and the boolean/list parsers
//! - [`actor`]: the "string or object" actor field found in event payloads

pub mod actions;
pub mod actor;
pub mod error;
pub mod inputs;
pub mod telemetry;

pub use actor::Actor;
pub use error::{InputError, Result};
pub use inputs::{parse_bool, parse_disableable_list, parse_list, Inputs};
pub use telemetry::init_tracing;
