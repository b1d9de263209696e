// crates/warbler-cli/src/main.rs
// ============================================================================
// Module: Warbler CLI Entry Point
// Description: Command dispatcher for serving Warbler and managing its store.
// Purpose: Run the HTTP server and database maintenance from one binary.
// Dependencies: clap, thiserror, tokio, tracing, warbler-config, warbler-web
// ============================================================================

//! ## Overview
//! `warbler serve` loads configuration, installs logging, and runs the HTTP
//! server until Ctrl-C. `init-db` and `reset-db` manage the `SQLite` schema,
//! `check-config` validates a config file, and `config-example` prints a
//! complete annotated config.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use warbler_cli::logging::init_tracing;
use warbler_cli::serve_policy::ALLOW_NON_LOOPBACK_ENV;
use warbler_cli::serve_policy::BindOutcome;
use warbler_cli::serve_policy::enforce_local_only;
use warbler_cli::serve_policy::resolve_allow_non_loopback;
use warbler_config::WarblerConfig;
use warbler_config::config_toml_example;
use warbler_store_sqlite::SqliteStoreMode;
use warbler_store_sqlite::SqliteWarblerStore;
use warbler_web::WarblerServer;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "warbler", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Warbler HTTP server.
    Serve(ServeCommand),
    /// Create the database schema if it does not exist.
    InitDb(ConfigArgs),
    /// Drop and recreate every table.
    ResetDb(ResetDbCommand),
    /// Load and validate configuration, then print a summary.
    CheckConfig(ConfigArgs),
    /// Print a complete example configuration file.
    ConfigExample,
}

/// Shared `--config` argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Config file path (defaults to warbler.toml or `WARBLER_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Override `server.bind`.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
    /// Allow binding to non-loopback addresses.
    #[arg(long, action = ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Configuration for the `reset-db` command.
#[derive(Args, Debug)]
struct ResetDbCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArgs,
    /// Confirm that all data should be deleted.
    #[arg(long, action = ArgAction::SetTrue)]
    yes: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        write_stdout_line(&format!("warbler {}", env!("CARGO_PKG_VERSION")))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::InitDb(args) => command_init_db(&args),
        Commands::ResetDb(command) => command_reset_db(&command),
        Commands::CheckConfig(args) => command_check_config(&args),
        Commands::ConfigExample => {
            write_stdout(&config_toml_example())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let mut config = load_config(&command.config)?;
    if let Some(bind) = command.bind {
        config.server.bind = bind;
        config.validate().map_err(|err| CliError::new(format!("Invalid --bind: {err}")))?;
    }
    let allow_non_loopback = resolve_allow_non_loopback(command.allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    let outcome = enforce_local_only(&config, allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    init_tracing(&config.logging).map_err(|err| CliError::new(err.to_string()))?;
    if outcome.network_exposed {
        warn_network_exposure(&outcome)?;
    }

    let server = tokio::task::spawn_blocking(move || WarblerServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("Server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("Server init failed: {err}")))?;
    tracing::info!(bind = %server.bind_addr(), "starting warbler");
    server.serve().await.map_err(|err| CliError::new(format!("Server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Emits a warning banner when the server is reachable from other hosts.
fn warn_network_exposure(outcome: &BindOutcome) -> CliResult<()> {
    write_stderr_line(&format!(
        "WARNING: warbler is bound to non-loopback address {} ({ALLOW_NON_LOOPBACK_ENV} or \
         --allow-non-loopback set)",
        outcome.bind_addr
    ))?;
    if !outcome.secure_cookie {
        write_stderr_line(
            "WARNING: session.secure_cookie is false; sessions travel over plain HTTP unless a \
             TLS proxy sets it",
        )?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Executes the `init-db` command.
fn command_init_db(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let store = open_store(&config)?;
    write_stdout_line(&format!("Database ready: {}", store.config().path.display()))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `reset-db` command.
fn command_reset_db(command: &ResetDbCommand) -> CliResult<ExitCode> {
    if !command.yes {
        return Err(CliError::new("reset-db deletes all data; rerun with --yes to confirm"));
    }
    let config = load_config(&command.config)?;
    let store = open_store(&config)?;
    store.reset().map_err(|err| CliError::new(format!("Database reset failed: {err}")))?;
    write_stdout_line(&format!("Database reset: {}", store.config().path.display()))?;
    Ok(ExitCode::SUCCESS)
}

/// Opens (and initializes) the configured store.
fn open_store(config: &WarblerConfig) -> CliResult<SqliteWarblerStore> {
    SqliteWarblerStore::new(config.store.clone())
        .map_err(|err| CliError::new(format!("Failed to open database: {err}")))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes the `check-config` command.
fn command_check_config(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    write_stdout_line(&render_config_summary(&config))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates configuration.
fn load_config(args: &ConfigArgs) -> CliResult<WarblerConfig> {
    WarblerConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))
}

/// Renders the `check-config` summary; the session secret is never printed.
fn render_config_summary(config: &WarblerConfig) -> String {
    let journal = match config.store.journal_mode {
        SqliteStoreMode::Wal => "wal",
        SqliteStoreMode::Delete => "delete",
    };
    let secret = if config.session.secret_generated { "generated per process" } else { "configured" };
    let static_dir = config
        .server
        .static_dir
        .as_ref()
        .map_or_else(|| "none".to_string(), |dir| dir.display().to_string());
    [
        "Config valid".to_string(),
        format!("  bind: {}", config.server.bind),
        format!("  static_dir: {static_dir}"),
        format!("  database: {} (journal {journal})", config.store.path.display()),
        format!("  session cookie: {}", config.session.cookie_name),
        format!("  session secret: {secret}"),
        format!("  csrf: {}", if config.session.csrf_enabled { "enabled" } else { "disabled" }),
        format!("  timeline_limit: {}", config.app.timeline_limit),
        format!("  log filter: {}", config.logging.filter),
    ]
    .join("\n")
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| output_error("stdout", &err))?;
    write_stdout_line("")
}

/// Writes `message` to stdout without a trailing newline.
fn write_stdout(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(message.as_bytes()).map_err(|err| output_error("stdout", &err))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| output_error("stdout", &err))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}").map_err(|err| output_error("stderr", &err))
}

/// Formats an output failure.
fn output_error(stream: &str, error: &std::io::Error) -> CliError {
    CliError::new(format!("Failed to write to {stream}: {error}"))
}

/// Emits an error message and returns a failing exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
