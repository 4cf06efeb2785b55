//! CLI command definitions, routing, and tracing setup.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use askctx_backend::ModelSet;
use askctx_core::{ProgressReporter, QueryConfig, QueryResult};
use askctx_shared::{
    AppConfig, FallbackCredential, InteractionMode, SourceDescriptor, init_config, load_config,
    load_config_from,
};
use askctx_source::{FileSelector, GitCloner};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// askctx: ask questions about code, with the code as context.
#[derive(Parser)]
#[command(
    name = "askctx",
    version,
    about = "Add a repository or file as context to a question for a language model.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.askctx/askctx.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ask a question about a remote repository or a local file.
    Ask(AskArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `askctx ask`.
#[derive(Args)]
pub(crate) struct AskArgs {
    /// Repository to clone and evaluate (wins over --file).
    #[arg(short, long)]
    pub url: Option<String>,

    /// Local file or directory to use as context.
    #[arg(short, long)]
    pub file: Option<String>,

    /// Question to ask about the code.
    #[arg(short, long)]
    pub question: String,

    /// API key (falls back to the env var named by backend.api_key_env).
    #[arg(short, long)]
    pub key: Option<String>,

    /// Interaction mode: raw, chat, or embedding.
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Model to use for the selected mode.
    #[arg(long)]
    pub model: Option<String>,

    /// Backend base URL (OpenAI-compatible).
    #[arg(long)]
    pub base_url: Option<String>,

    /// File extensions to include (comma-separated, e.g. go,rs).
    #[arg(long, value_delimiter = ',')]
    pub ext: Option<Vec<String>>,

    /// Regex of relative paths to skip (repeatable).
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Maximum corpus size in bytes (0 = unbounded).
    #[arg(long)]
    pub max_bytes: Option<u64>,

    /// Abort the whole run after this many seconds.
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Print the answer as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr, keeping stdout for the answer.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "askctx=warn",
        1 => "askctx=info",
        2 => "askctx=debug",
        _ => "askctx=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Ask(args) => cmd_ask(args, config).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

async fn cmd_ask(args: AskArgs, mut config: AppConfig) -> Result<()> {
    if both_sources_given(&args) {
        warn!("both --url and --file given; using --url");
    }
    let source = SourceDescriptor::select(args.url.as_deref(), args.file.as_deref())
        .ok_or_else(|| eyre!("no source given: pass --url <repository> or --file <path>"))?;

    let mode: InteractionMode = match args.mode.as_deref() {
        Some(m) => m.parse()?,
        None => config.defaults.mode,
    };

    if let Some(base_url) = args.base_url {
        config.backend.base_url = base_url;
    }

    let extensions = args.ext.unwrap_or_else(|| config.defaults.extensions.clone());
    let mut excludes = config.defaults.exclude_patterns.clone();
    excludes.extend(args.exclude);
    let selector = FileSelector::new(&extensions, &excludes)?;

    let query = QueryConfig {
        source,
        question: args.question,
        mode,
        explicit_key: args.key,
        fallback_key: FallbackCredential::from_env(&config.backend.api_key_env),
        models: ModelSet::from(&config.backend).with_override(mode, args.model.as_deref()),
        backend: config.backend.clone(),
        selector,
        max_corpus_bytes: args.max_bytes.unwrap_or(config.defaults.max_corpus_bytes),
        workspace_parent: config.source.workspace_parent.clone(),
    };

    info!(
        source = %query.source,
        %mode,
        extensions = ?extensions,
        "asking"
    );

    let cancel = CancellationToken::new();
    let deadline = args
        .deadline_secs
        .or(config.defaults.deadline_secs)
        .map(Duration::from_secs);
    spawn_cancel_watcher(cancel.clone(), deadline);
    // Stops the watcher when this command returns.
    let _watcher_guard = cancel.clone().drop_guard();

    let reporter = CliProgress::new();
    let cloner = GitCloner::from(&config.source);
    let result = askctx_core::run_query(&query, cloner, &reporter, &cancel).await?;
    drop(reporter);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.answer)?);
    } else {
        println!("{}", result.answer);
    }

    Ok(())
}

/// Both flags carry a non-empty value; `SourceDescriptor::select` ignores empty ones.
fn both_sources_given(args: &AskArgs) -> bool {
    let given = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    given(&args.url) && given(&args.file)
}

/// Cancel `cancel` on Ctrl-C, on SIGTERM, or once `deadline` elapses.
fn spawn_cancel_watcher(cancel: CancellationToken, deadline: Option<Duration>) {
    // Handlers are installed before returning so an early signal is not lost.
    let shutdown = shutdown_signal();
    tokio::spawn(watch_for_cancel(cancel, deadline, shutdown));
}

async fn watch_for_cancel(
    cancel: CancellationToken,
    deadline: Option<Duration>,
    shutdown: impl Future<Output = &'static str>,
) {
    let deadline_elapsed = async {
        match deadline {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => return,
        signal = shutdown => warn!(signal, "termination requested, cancelling run"),
        _ = deadline_elapsed => {
            warn!(
                deadline_secs = ?deadline.map(|d| d.as_secs()),
                "deadline reached, cancelling run"
            );
        }
    }
    cancel.cancel();
}

/// Resolves with the signal name on Ctrl-C, or on SIGTERM where supported.
fn shutdown_signal() -> impl Future<Output = &'static str> + Send {
    #[cfg(unix)]
    let terminate = {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                None
            }
        }
    };

    async move {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match terminate {
                Some(mut stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = interrupt => "SIGINT",
            _ = terminate => "SIGTERM",
        }
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn clone_progress(&self, line: &str) {
        debug!(target: "askctx::git", "{line}");
        self.spinner.set_message(format!("git: {line}"));
    }

    fn done(&self, result: &QueryResult) {
        debug!(
            run_id = %result.run_id,
            files = result.file_count,
            bytes = result.corpus_bytes,
            elapsed_ms = result.elapsed.as_millis(),
            "answer received"
        );
        self.spinner.finish_and_clear();
    }
}

// Failure paths never reach `done`; clear the spinner so the diagnostic stands alone.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
