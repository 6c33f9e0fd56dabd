//! ghkit - GitHub Actions deployment helpers CLI
//!
//! ## Commands
//!
//! - `urls`: compute deployment URLs and aliases from explicit arguments
//! - `urls-from-env`: same, with context read from the Actions environment
//! - `deployment-host`: extract the deployment host from deploy CLI output
//! - `preview-comment`: render the preview-ready PR comment for a `workflow_run` event
//! - `search-scope`: decide which search-index crawls a set of changed paths needs
//! - `prune-ids`: list search document ids for removed content files
//! - `act`: parse, plan or run a workflow locally through `gh act`

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use ghkit_act::{
    build_act_invocations, parse_workflow_file, run_invocations, ActConfig, FixtureLayout,
    ProcessExecutor, TempPaths,
};
use ghkit_core::{actions, actor::DEFAULT_ACTOR, Inputs};
use ghkit_deploy::{
    build_deployment_urls, determine_crawl_scope, parse_deployment_host, removed_document_ids,
    AliasBuildRequest, AliasBuildResult, ChangedFile, Collection, CrawlScope, DeployContext,
    PreviewComment, WorkflowRunPayload,
};

#[derive(Parser)]
#[command(name = "ghkit")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "GitHub Actions deployment helpers and local workflow replay", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Repository root holding `.github/`
    #[arg(long, global = true, env = "GHKIT_REPO_ROOT", default_value = ".")]
    repo_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute deployment URLs and the aliases to assign
    Urls(UrlsArgs),

    /// Compute deployment URLs using the GitHub Actions environment as context
    UrlsFromEnv {
        /// Canonical host returned by the deploy
        #[arg(long)]
        deployment_host: String,

        /// Also write PREVIEW_URL, DEPLOYMENT_URLS and DEPLOYMENT_UNIQUE_URL step outputs
        #[arg(long)]
        set_outputs: bool,
    },

    /// Print the deployment host found in deploy CLI output
    DeploymentHost {
        /// File holding the CLI output (default: stdin)
        file: Option<PathBuf>,
    },

    /// Render the preview-ready PR comment for a workflow_run event
    PreviewComment {
        /// Path to the workflow_run event payload
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event_path: PathBuf,

        /// Preview URL to link to
        #[arg(long)]
        preview_url: String,

        /// Actor shown when the payload names none
        #[arg(long, env = "GITHUB_ACTOR", default_value = DEFAULT_ACTOR)]
        actor: String,
    },

    /// Decide the search-index crawl scope for changed paths
    SearchScope {
        /// File listing one changed path per line (default: stdin)
        file: Option<PathBuf>,

        /// Directory holding the content collections
        #[arg(long, env = "INPUT_CONTENT_ROOT", default_value = "src/content")]
        content_root: String,

        /// Also write should_index and crawl_* step outputs
        #[arg(long)]
        set_outputs: bool,
    },

    /// List search document ids for content files removed in a change
    PruneIds {
        /// JSON array of changed files (`filename`, `status`) (default: stdin)
        file: Option<PathBuf>,

        /// Site origin the document ids are built on
        #[arg(long, env = "INPUT_SITE_ORIGIN")]
        site_origin: String,

        /// Directory holding the content collections
        #[arg(long, env = "INPUT_CONTENT_ROOT", default_value = "src/content")]
        content_root: String,

        /// Collection to prune: articles, services or case-studies
        #[arg(long, default_value = "articles")]
        collection: String,

        /// Also write the deleted_count step output
        #[arg(long)]
        set_outputs: bool,
    },

    /// Replay workflows locally
    Act {
        /// Replay command, split on whitespace
        #[arg(long, global = true, env = "GHKIT_ACT_PROGRAM", default_value = "gh act")]
        act_program: String,

        #[command(subcommand)]
        action: ActAction,
    },
}

#[derive(Args, Debug)]
struct UrlsArgs {
    /// Deploy belongs to a pull request
    #[arg(long)]
    pull_request: bool,

    /// Preview alias template for pull requests
    #[arg(long)]
    pr_preview_domain: Option<String>,

    /// Alias template for non-PR deploys (repeatable)
    #[arg(long = "alias-domain")]
    alias_domains: Vec<String>,

    /// Canonical host returned by the deploy
    #[arg(long)]
    deployment_host: String,

    /// Repository owner
    #[arg(long)]
    user: String,

    /// Repository name
    #[arg(long)]
    repository: String,

    /// Branch name
    #[arg(long)]
    branch: String,

    /// Pull request number
    #[arg(long)]
    pr_number: Option<u64>,

    /// Commit SHA
    #[arg(long)]
    sha: String,

    /// Also write PREVIEW_URL, DEPLOYMENT_URLS and DEPLOYMENT_UNIQUE_URL step outputs
    #[arg(long)]
    set_outputs: bool,
}

impl UrlsArgs {
    fn to_request(&self) -> AliasBuildRequest {
        AliasBuildRequest {
            is_pull_request: self.pull_request,
            pr_preview_domain: self.pr_preview_domain.clone(),
            alias_domains: if self.alias_domains.is_empty() {
                None
            } else {
                Some(self.alias_domains.clone())
            },
            deployment_host: self.deployment_host.clone(),
            user: self.user.clone(),
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            pr_number: self.pr_number,
            commit_sha: self.sha.clone(),
        }
    }
}

#[derive(Subcommand)]
enum ActAction {
    /// Print what the harness extracts from a workflow
    Parse {
        /// Workflow name under .github/workflows (extension optional)
        workflow: String,
    },

    /// Print the invocations that would run
    Plan {
        /// Workflow name under .github/workflows (extension optional)
        workflow: String,
    },

    /// Run every invocation, stopping at the first failure
    Run {
        /// Workflow name under .github/workflows (extension optional)
        workflow: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ghkit_core::init_tracing(cli.json, level);

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => actions::set_failed(&format!("{err:#}")),
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let layout = FixtureLayout::new(cli.repo_root);

    match cli.command {
        Commands::Urls(args) => cmd_urls(&args.to_request(), args.set_outputs),
        Commands::UrlsFromEnv {
            deployment_host,
            set_outputs,
        } => cmd_urls_from_env(&deployment_host, set_outputs),
        Commands::DeploymentHost { file } => cmd_deployment_host(file.as_deref()),
        Commands::PreviewComment {
            event_path,
            preview_url,
            actor,
        } => cmd_preview_comment(&event_path, &preview_url, &actor),
        Commands::SearchScope {
            file,
            content_root,
            set_outputs,
        } => cmd_search_scope(file.as_deref(), &content_root, set_outputs),
        Commands::PruneIds {
            file,
            site_origin,
            content_root,
            collection,
            set_outputs,
        } => cmd_prune_ids(
            file.as_deref(),
            &site_origin,
            &content_root,
            &collection,
            set_outputs,
        ),
        Commands::Act {
            act_program,
            action,
        } => {
            let config = ActConfig::from_command(&act_program);
            match action {
                ActAction::Parse { workflow } => cmd_act_parse(&layout, &workflow),
                ActAction::Plan { workflow } => cmd_act_plan(&layout, &workflow, &config),
                ActAction::Run { workflow } => cmd_act_run(&layout, &workflow, &config).await,
            }
        }
    }
}

fn cmd_urls(request: &AliasBuildRequest, set_outputs: bool) -> Result<i32> {
    let result = build_deployment_urls(request);

    if let Some(truncation) = &result.truncation {
        actions::warning(&format!(
            "Preview alias '{}' exceeds the Vercel limit, using '{}'",
            truncation.original_prefix, truncation.truncated_alias
        ));
    }
    if set_outputs {
        write_url_outputs(&result)?;
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(0)
}

fn cmd_urls_from_env(deployment_host: &str, set_outputs: bool) -> Result<i32> {
    let inputs = Inputs::from_env();
    let context = DeployContext::from_inputs(&inputs).context("Failed to read deploy context")?;
    info!(
        repository = %context.repository,
        branch = %context.branch,
        pr = ?context.pr_number,
        fork = context.is_fork,
        "computing deployment URLs"
    );
    cmd_urls(&context.to_alias_request(deployment_host), set_outputs)
}

fn write_url_outputs(result: &AliasBuildResult) -> Result<()> {
    actions::set_output("PREVIEW_URL", &result.preview_url)?;
    actions::set_output(
        "DEPLOYMENT_URLS",
        &serde_json::to_string(&result.deployment_urls)?,
    )?;
    actions::set_output("DEPLOYMENT_UNIQUE_URL", result.unique_url())?;
    Ok(())
}

/// Read a file, or stdin when no path is given.
fn read_file_or_stdin(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn cmd_deployment_host(file: Option<&Path>) -> Result<i32> {
    let output = read_file_or_stdin(file)?;
    println!("{}", parse_deployment_host(&output)?);
    Ok(0)
}

fn cmd_search_scope(file: Option<&Path>, content_root: &str, set_outputs: bool) -> Result<i32> {
    let listing = read_file_or_stdin(file)?;
    let changed: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let scope = determine_crawl_scope(&changed[..], content_root);
    if set_outputs {
        write_scope_outputs(&scope)?;
    }
    println!("{}", serde_json::to_string_pretty(&scope)?);
    Ok(0)
}

fn write_scope_outputs(scope: &CrawlScope) -> Result<()> {
    actions::set_output("should_index", &scope.should_index.to_string())?;
    actions::set_output("crawl_articles", &scope.crawl_articles.to_string())?;
    actions::set_output("crawl_services", &scope.crawl_services.to_string())?;
    actions::set_output("crawl_case_studies", &scope.crawl_case_studies.to_string())?;
    Ok(())
}

fn cmd_prune_ids(
    file: Option<&Path>,
    site_origin: &str,
    content_root: &str,
    collection: &str,
    set_outputs: bool,
) -> Result<i32> {
    let collection: Collection = collection.parse()?;
    let files: Vec<ChangedFile> = serde_json::from_str(&read_file_or_stdin(file)?)
        .context("Changed files must be a JSON array")?;

    let ids = removed_document_ids(&files, site_origin, content_root, collection)?;
    if ids.is_empty() {
        info!(collection = %collection, "no removed content to prune");
    }
    if set_outputs {
        actions::set_output("deleted_count", &ids.len().to_string())?;
    }
    println!("{}", serde_json::to_string_pretty(&ids)?);
    Ok(0)
}

fn cmd_preview_comment(event_path: &Path, preview_url: &str, actor: &str) -> Result<i32> {
    let payload = WorkflowRunPayload::from_path(event_path)
        .with_context(|| format!("Failed to load event payload {}", event_path.display()))?;

    if let Some(comment) = PreviewComment::from_payload(&payload, preview_url, actor)? {
        info!(
            pr = comment.pr_number,
            repo = %format!("{}/{}", comment.owner, comment.repo),
            "rendered preview comment"
        );
        println!("{}", comment.body());
    }
    Ok(0)
}

fn cmd_act_parse(layout: &FixtureLayout, workflow: &str) -> Result<i32> {
    let descriptor = parse_workflow_file(&layout.workflow_path(workflow))?;
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(0)
}

fn process_environ() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn cmd_act_plan(layout: &FixtureLayout, workflow: &str, config: &ActConfig) -> Result<i32> {
    // Secrets files are removed on drop, so the plan only shows their paths.
    let mut temp_paths = TempPaths::new();
    let invocations =
        build_act_invocations(layout, workflow, &process_environ(), config, &mut temp_paths)?;

    for invocation in &invocations {
        println!("{}", invocation.command_line());
    }
    temp_paths.cleanup();
    Ok(0)
}

async fn cmd_act_run(layout: &FixtureLayout, workflow: &str, config: &ActConfig) -> Result<i32> {
    let mut temp_paths = TempPaths::new();
    let outcome = execute_workflow(layout, workflow, config, &mut temp_paths).await;
    temp_paths.cleanup();
    outcome
}

async fn execute_workflow(
    layout: &FixtureLayout,
    workflow: &str,
    config: &ActConfig,
    temp_paths: &mut TempPaths,
) -> Result<i32> {
    let invocations =
        build_act_invocations(layout, workflow, &process_environ(), config, temp_paths)?;
    let docker_config = temp_paths
        .docker_config_stub()
        .context("Failed to create docker config stub")?;

    let executor = ProcessExecutor::new(Some(docker_config));
    let report = run_invocations(&executor, &invocations)
        .await
        .with_context(|| format!("Failed to run {}", config.program))?;

    if report.passed() {
        info!(invocations = report.outcomes.len(), "all invocations passed");
    } else {
        warn!(
            exit_code = report.exit_code(),
            skipped = report.skipped,
            "stopped at first failing invocation"
        );
    }
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_urls_args_to_request() {
        let cli = Cli::try_parse_from([
            "ghkit",
            "urls",
            "--alias-domain",
            "{BRANCH}.example.com",
            "--alias-domain",
            "www.example.com",
            "--deployment-host",
            "app-abc123.vercel.app",
            "--user",
            "octocat",
            "--repository",
            "site",
            "--branch",
            "main",
            "--sha",
            "abcdef1",
        ])
        .unwrap();

        let Commands::Urls(args) = cli.command else {
            panic!("expected urls command");
        };
        let request = args.to_request();
        assert!(!request.is_pull_request);
        assert_eq!(
            request.alias_domains,
            Some(vec![
                "{BRANCH}.example.com".to_string(),
                "www.example.com".to_string()
            ])
        );
        assert_eq!(request.pr_number, None);
        assert_eq!(request.commit_sha, "abcdef1");
    }

    #[test]
    fn test_no_alias_domains_means_none() {
        let cli = Cli::try_parse_from([
            "ghkit",
            "urls",
            "--pull-request",
            "--pr-number",
            "7",
            "--deployment-host",
            "h.vercel.app",
            "--user",
            "u",
            "--repository",
            "r",
            "--branch",
            "b",
            "--sha",
            "s",
        ])
        .unwrap();

        let Commands::Urls(args) = cli.command else {
            panic!("expected urls command");
        };
        let request = args.to_request();
        assert!(request.is_pull_request);
        assert_eq!(request.pr_number, Some(7));
        assert_eq!(request.alias_domains, None);
    }

    #[test]
    fn test_act_program_flag() {
        let cli = Cli::try_parse_from([
            "ghkit",
            "--repo-root",
            "/tmp/repo",
            "act",
            "plan",
            "ci",
            "--act-program",
            "act",
        ])
        .unwrap();

        assert_eq!(cli.repo_root, PathBuf::from("/tmp/repo"));
        let Commands::Act {
            act_program,
            action: ActAction::Plan { workflow },
        } = cli.command
        else {
            panic!("expected act plan");
        };
        assert_eq!(workflow, "ci");
        assert_eq!(ActConfig::from_command(&act_program).program, "act");
    }

    #[test]
    fn test_deployment_host_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deploy.log");
        std::fs::write(&path, "Preview: https://app-abc.vercel.app [2s]\n").unwrap();
        assert_eq!(cmd_deployment_host(Some(&path)).unwrap(), 0);
    }

    #[test]
    fn test_search_scope_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changed.txt");
        std::fs::write(&path, "src/content/articles/a.mdx\n\nREADME.md\n").unwrap();
        assert_eq!(cmd_search_scope(Some(&path), "src/content", false).unwrap(), 0);
    }

    #[test]
    fn test_prune_ids_rejects_unknown_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(cmd_prune_ids(Some(&path), "https://x.com", "src/content", "authors", false).is_err());
        assert_eq!(
            cmd_prune_ids(Some(&path), "https://x.com", "src/content", "articles", false).unwrap(),
            0
        );
    }

    #[test]
    fn test_act_parse_missing_workflow_fails() {
        let dir = tempfile::tempdir().unwrap();
        let layout = FixtureLayout::new(dir.path());
        assert!(cmd_act_parse(&layout, "missing").is_err());
    }
}
