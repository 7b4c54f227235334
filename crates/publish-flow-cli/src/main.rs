// crates/publish-flow-cli/src/main.rs
// ============================================================================
// Module: Publish Flow CLI Entry Point
// Description: Command dispatcher for the publish workflow events.
// Purpose: Wire config, forge, git, registry, and probe into the workflow.
// Dependencies: clap, publish-flow-config, publish-flow-core,
//               publish-flow-providers, publish-flow-store-json, serde_json,
//               thiserror, tracing
// ============================================================================

//! ## Overview
//! Each subcommand corresponds to one repository event: an issue check, a
//! closed pull request, a submitted review, or a manual conflict sweep. The
//! `validate` subcommand runs the validation pipeline offline against a body
//! file and prints the outcome as JSON. All user-facing lines go through the
//! CLI catalog; logs go to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use publish_flow_cli::i18n::Locale;
use publish_flow_cli::i18n::set_locale;
use publish_flow_cli::logging::LOG_ENV_VAR;
use publish_flow_cli::logging::LogFormat;
use publish_flow_cli::logging::init_logging;
use publish_flow_cli::t;
use publish_flow_config::PublishFlowConfig;
use publish_flow_core::CheckReport;
use publish_flow_core::ClosedReport;
use publish_flow_core::CommentAction;
use publish_flow_core::ConflictResolution;
use publish_flow_core::Ignored;
use publish_flow_core::IssueNumber;
use publish_flow_core::MarkdownReportRenderer;
use publish_flow_core::PublishType;
use publish_flow_core::PublishTypeRegistry;
use publish_flow_core::PublishWorkflow;
use publish_flow_core::ReachabilityCache;
use publish_flow_core::ReviewReport;
use publish_flow_core::SkipReason;
use publish_flow_core::Submission;
use publish_flow_core::ValidationEnv;
use publish_flow_core::WorkflowServices;
use publish_flow_core::validate_submission;
use publish_flow_providers::GitHubConfig;
use publish_flow_providers::GitHubForge;
use publish_flow_providers::HttpProbeConfig;
use publish_flow_providers::HttpReachabilityProbe;
use publish_flow_providers::ShellCommandRunner;
use publish_flow_store_json::JsonRegistryConfig;
use publish_flow_store_json::JsonRegistryStore;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of an issue body file accepted by `validate`.
const MAX_BODY_BYTES: usize = 256 * 1024;
/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "PUBLISH_FLOW_LANG";
/// Environment variable holding the forge token.
const TOKEN_ENV: &str = "GITHUB_TOKEN";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "publish-flow", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (overrides `PUBLISH_FLOW_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(long, short = 'v', action = ArgAction::SetTrue, global = true)]
    verbose: bool,
    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Human, global = true)]
    log_format: LogFormat,
    /// Preferred output language (overrides `PUBLISH_FLOW_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a publish issue after it was opened, edited, or commented on.
    Check(CheckCommand),
    /// Handle a closed publish pull request.
    PrClosed(PullRequestArgs),
    /// Handle a submitted pull request review.
    Review(ReviewCommand),
    /// Rebuild every open publish pull request from the base branch.
    ResolveConflicts,
    /// Validate an issue body offline and print the outcome as JSON.
    Validate(ValidateCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Issue number to check.
    #[arg(long)]
    issue: u64,
    /// Login of the comment author when the event was a new comment.
    #[arg(long)]
    commenter: Option<String>,
}

/// Arguments naming one pull request.
#[derive(Args, Debug)]
struct PullRequestArgs {
    /// Pull request number.
    #[arg(long = "pr")]
    pull: u64,
}

/// Arguments for `review`.
#[derive(Args, Debug)]
struct ReviewCommand {
    /// Pull request number.
    #[arg(long = "pr")]
    pull: u64,
    /// Review state (e.g., `approved`).
    #[arg(long)]
    state: String,
    /// Reviewer association with the repository (e.g., `OWNER`).
    #[arg(long)]
    association: String,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// File holding the issue body.
    #[arg(long, value_name = "PATH")]
    body_file: PathBuf,
    /// Submitting account login.
    #[arg(long)]
    author: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config, then exit.
    Validate,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LangArg {
    /// English.
    En,
    /// Chinese.
    Zh,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Zh => Self::Zh,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors raised while reading a size-limited input file.
#[derive(Debug)]
enum ReadLimitError {
    /// The file could not be opened or read.
    Io(std::io::Error),
    /// The file exceeds the limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        Cli::command()
            .print_help()
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    };

    let directive = std::env::var(LOG_ENV_VAR).ok();
    init_logging(cli.verbose, cli.log_format, directive.as_deref())
        .map_err(|err| CliError::new(t!("logging.init_failed", error = err)))?;

    let config = PublishFlowConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;

    match command {
        Commands::Check(command) => command_check(&config, &command),
        Commands::PrClosed(command) => command_pr_closed(&config, &command),
        Commands::Review(command) => command_review(&config, &command),
        Commands::ResolveConflicts => command_resolve_conflicts(&config),
        Commands::Validate(command) => command_validate(&config, &command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Service Wiring
// ============================================================================

/// Concrete collaborators built from the config.
struct Services {
    /// Forge client.
    forge: GitHubForge,
    /// Git and hook runner.
    runner: ShellCommandRunner,
    /// Registry file.
    store: JsonRegistryStore,
    /// URL probe.
    probe: HttpReachabilityProbe,
    /// Report renderer.
    renderer: MarkdownReportRenderer,
    /// Publish type handlers.
    types: PublishTypeRegistry,
}

impl Services {
    /// Builds every collaborator from the config and environment.
    fn build(config: &PublishFlowConfig) -> CliResult<Self> {
        let repo =
            config.repository.repo().ok_or_else(|| CliError::new(t!("repository.missing")))?;
        let mut forge_config = GitHubConfig::new(repo);
        forge_config.api_base.clone_from(&config.repository.api_base);
        forge_config.user_agent.clone_from(&config.probe.user_agent);
        forge_config.token = std::env::var(TOKEN_ENV).ok().filter(|token| !token.is_empty());
        let forge = GitHubForge::new(forge_config)
            .map_err(|err| CliError::new(t!("forge.init_failed", error = err)))?;
        Ok(Self {
            forge,
            runner: ShellCommandRunner::new(),
            store: open_store(config)?,
            probe: build_probe(config)?,
            renderer: MarkdownReportRenderer,
            types: build_types()?,
        })
    }

    /// Borrows the collaborators for a workflow.
    fn workflow_services(&self) -> WorkflowServices<'_> {
        WorkflowServices {
            forge: &self.forge,
            runner: &self.runner,
            store: &self.store,
            probe: &self.probe,
            renderer: &self.renderer,
            types: &self.types,
        }
    }
}

/// Opens the registry file named by the config.
fn open_store(config: &PublishFlowConfig) -> CliResult<JsonRegistryStore> {
    let path = &config.input.registry_path;
    JsonRegistryStore::new(JsonRegistryConfig::new(path.clone())).map_err(|err| {
        CliError::new(t!("store.init_failed", path = path.display(), error = err))
    })
}

/// Builds the HTTP reachability probe.
fn build_probe(config: &PublishFlowConfig) -> CliResult<HttpReachabilityProbe> {
    let probe_config = HttpProbeConfig {
        timeout_ms: config.probe.timeout_ms,
        user_agent: config.probe.user_agent.clone(),
        follow_redirects: config.probe.follow_redirects,
        ..HttpProbeConfig::default()
    };
    HttpReachabilityProbe::new(&probe_config)
        .map_err(|err| CliError::new(t!("probe.init_failed", error = err)))
}

/// Builds the built-in publish type handlers.
fn build_types() -> CliResult<PublishTypeRegistry> {
    PublishTypeRegistry::builtin()
        .map_err(|err| CliError::new(t!("types.init_failed", error = err)))
}

// ============================================================================
// SECTION: Event Commands
// ============================================================================

/// Executes the `check` command.
fn command_check(config: &PublishFlowConfig, command: &CheckCommand) -> CliResult<ExitCode> {
    let services = Services::build(config)?;
    let settings = config.workflow_settings();
    let mut workflow = PublishWorkflow::new(services.workflow_services(), &settings);
    let report = workflow
        .handle_publish_check(IssueNumber::from(command.issue), command.commenter.as_deref())
        .map_err(|err| CliError::new(t!("workflow.failed", error = err)))?;
    for line in render_check_report(command.issue, &report) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `pr-closed` command.
fn command_pr_closed(config: &PublishFlowConfig, command: &PullRequestArgs) -> CliResult<ExitCode> {
    let services = Services::build(config)?;
    let settings = config.workflow_settings();
    let mut workflow = PublishWorkflow::new(services.workflow_services(), &settings);
    let report = workflow
        .handle_pull_request_closed(command.pull)
        .map_err(|err| CliError::new(t!("workflow.failed", error = err)))?;
    for line in render_closed_report(command.pull, &report) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `review` command.
fn command_review(config: &PublishFlowConfig, command: &ReviewCommand) -> CliResult<ExitCode> {
    let services = Services::build(config)?;
    let settings = config.workflow_settings();
    let mut workflow = PublishWorkflow::new(services.workflow_services(), &settings);
    let report = workflow
        .handle_review_submitted(command.pull, &command.state, &command.association)
        .map_err(|err| CliError::new(t!("workflow.failed", error = err)))?;
    for line in render_review_report(command.pull, &report) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `resolve-conflicts` command.
fn command_resolve_conflicts(config: &PublishFlowConfig) -> CliResult<ExitCode> {
    let services = Services::build(config)?;
    let settings = config.workflow_settings();
    let mut workflow = PublishWorkflow::new(services.workflow_services(), &settings);
    let resolutions = workflow
        .resolve_open_conflicts()
        .map_err(|err| CliError::new(t!("workflow.failed", error = err)))?;
    let mut lines = render_resolutions(&resolutions);
    if lines.is_empty() {
        lines.push(t!("resolve.none"));
    }
    for line in lines {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Offline Validation
// ============================================================================

/// Executes the `validate` command.
///
/// Exits with failure when the submission is invalid so scripts can gate on
/// the status alone.
fn command_validate(config: &PublishFlowConfig, command: &ValidateCommand) -> CliResult<ExitCode> {
    let body = read_body(&command.body_file)?;
    let store = open_store(config)?;
    let probe = build_probe(config)?;
    let types = build_types()?;
    let handler = types
        .handler(PublishType::Plugin)
        .map_err(|err| CliError::new(t!("workflow.failed", error = err)))?;

    let load_test = config.load_test();
    let mut cache = ReachabilityCache::new();
    let mut env = ValidationEnv {
        locale: config.report.locale,
        load_test: &load_test,
        probe: &probe,
        cache: &mut cache,
        registry: &store,
    };
    let submission = Submission {
        body: &body,
        author: command.author.as_deref(),
    };
    let outcome = validate_submission(handler, &submission, &mut env)
        .map_err(|err| CliError::new(t!("workflow.failed", error = err)))?;
    info!(valid = outcome.valid, errors = outcome.errors.len(), "offline validation finished");

    let rendered = serde_json::to_string_pretty(&outcome)
        .map_err(|err| CliError::new(t!("output.json_failed", error = err)))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(if outcome.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Reads the issue body file as UTF-8 text.
fn read_body(path: &Path) -> CliResult<String> {
    let bytes = read_bytes_with_limit(path, MAX_BODY_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(t!("input.read_failed", path = path.display(), error = err))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(t!(
            "input.read_too_large",
            path = path.display(),
            size = size,
            limit = limit
        )),
    })?;
    String::from_utf8(bytes).map_err(|err| {
        CliError::new(t!("input.read_failed", path = path.display(), error = err))
    })
}

/// Reads at most `max_bytes` from `path`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            write_stdout_line(&t!("config.validate.ok"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Report Rendering
// ============================================================================

/// Renders the summary lines for a check report.
fn render_check_report(issue: u64, report: &CheckReport) -> Vec<String> {
    match report {
        CheckReport::Ignored(reason) => {
            vec![t!("check.ignored", issue = issue, reason = ignored_label(*reason))]
        }
        CheckReport::Checked {
            outcome,
            title,
            pull_request,
            comment,
        } => {
            let comment = comment_label(*comment);
            let mut lines = if outcome.valid {
                vec![t!("check.passed", issue = issue, title = title, comment = comment)]
            } else {
                vec![t!(
                    "check.failed",
                    issue = issue,
                    count = outcome.errors.len(),
                    comment = comment
                )]
            };
            if let Some(number) = pull_request {
                lines.push(t!("check.pull_request", number = number));
            }
            lines
        }
    }
}

/// Renders the summary lines for a closed pull request.
fn render_closed_report(pull: u64, report: &ClosedReport) -> Vec<String> {
    match report {
        ClosedReport::Ignored(reason) => {
            vec![t!("closed.ignored", pull = pull, reason = ignored_label(*reason))]
        }
        ClosedReport::Handled {
            issue,
            closed_issue,
            resolutions,
        } => {
            let mut lines =
                vec![t!("closed.handled", pull = pull, issue = issue, closed = closed_issue)];
            lines.extend(render_resolutions(resolutions));
            lines
        }
    }
}

/// Renders the summary lines for a review.
fn render_review_report(pull: u64, report: &ReviewReport) -> Vec<String> {
    match report {
        ReviewReport::Ignored(reason) => {
            vec![t!("review.ignored", pull = pull, reason = ignored_label(*reason))]
        }
        ReviewReport::Merged {
            number,
            resolutions,
        } => {
            let mut lines = render_resolutions(resolutions);
            lines.push(t!("review.merged", pull = number));
            lines
        }
    }
}

/// Renders one line per conflict resolution.
fn render_resolutions(resolutions: &[ConflictResolution]) -> Vec<String> {
    resolutions
        .iter()
        .map(|resolution| match resolution {
            ConflictResolution::Replayed {
                number,
                branch,
            } => t!("resolve.replayed", pull = number, branch = branch.branch),
            ConflictResolution::Skipped {
                number,
                reason,
            } => t!("resolve.skipped", pull = number, reason = skip_label(*reason)),
        })
        .collect()
}

/// Returns a stable label for an ignore reason.
const fn ignored_label(reason: Ignored) -> &'static str {
    match reason {
        Ignored::BotComment => "bot comment",
        Ignored::PullRequest => "pull request",
        Ignored::NotPublish => "not a publish request",
        Ignored::NotOpen => "not open",
        Ignored::NoIssueNumber => "no issue number",
        Ignored::NotMaintainer => "not a maintainer",
        Ignored::NotApproved => "not approved",
    }
}

/// Returns a stable label for a skip reason.
const fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NoIssueNumber => "no issue number",
        SkipReason::Draft => "draft",
        SkipReason::NoPublishType => "no publish type",
        SkipReason::NoName => "no name",
        SkipReason::NoEntry => "no registry entry",
    }
}

/// Returns a stable label for a comment action.
const fn comment_label(action: CommentAction) -> &'static str {
    match action {
        CommentAction::Created => "created",
        CommentAction::Updated => "updated",
        CommentAction::Unchanged => "unchanged",
    }
}

// ============================================================================
// SECTION: Locale
// ============================================================================

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang.filter(|value| !value.trim().is_empty()) {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
