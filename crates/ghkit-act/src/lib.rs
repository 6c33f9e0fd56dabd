//! ghkit act - replay GitHub workflows locally through `gh act`
//!
//! Reads a workflow file with a small line-oriented parser (no general YAML
//! library), picks the trigger event to simulate, and builds one `gh act`
//! command line per job, wired to per-environment fixture files under
//! `.github/test/`. Invocations run strictly one after another.

pub mod env_file;
pub mod error;
pub mod invocation;
pub mod layout;
pub mod runner;
pub mod temp_paths;
pub mod workflow;

pub use env_file::{looks_like_token, parse_key_value_file, parse_key_value_str};
pub use error::{HarnessError, Result};
pub use invocation::{build_act_invocations, choose_event, ActConfig, ActInvocation};
pub use layout::FixtureLayout;
pub use runner::{run_invocations, InvocationExecutor, ProcessExecutor, RunReport};
pub use temp_paths::TempPaths;
pub use workflow::{parse_workflow_file, parse_workflow_str, WorkflowDescriptor, WorkflowJob};
