// crates/warbler-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and the config summary.
// Purpose: Ensure commands parse as documented and secrets stay out of output.
// Dependencies: clap, warbler-config
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use clap::CommandFactory;
use clap::Parser;
use warbler_config::WarblerConfig;

use super::Cli;
use super::Commands;
use super::render_config_summary;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn serve_accepts_bind_and_opt_in() {
    let cli = Cli::try_parse_from([
        "warbler",
        "serve",
        "--config",
        "custom.toml",
        "--bind",
        "0.0.0.0:8080",
        "--allow-non-loopback",
    ])
    .unwrap();
    let Some(Commands::Serve(command)) = cli.command else {
        panic!("expected serve command");
    };
    assert_eq!(command.config.config.unwrap().to_str(), Some("custom.toml"));
    assert_eq!(command.bind.as_deref(), Some("0.0.0.0:8080"));
    assert!(command.allow_non_loopback);
}

#[test]
fn reset_db_defaults_to_unconfirmed() {
    let cli = Cli::try_parse_from(["warbler", "reset-db"]).unwrap();
    let Some(Commands::ResetDb(command)) = cli.command else {
        panic!("expected reset-db command");
    };
    assert!(!command.yes);
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["warbler", "migrate"]).is_err());
}

#[test]
fn config_summary_never_prints_secret() {
    let mut config = WarblerConfig::default();
    config.session.secret_key = Some("s".repeat(40));
    config.validate().unwrap();
    let summary = render_config_summary(&config);
    assert!(summary.starts_with("Config valid"));
    assert!(summary.contains("session secret: configured"));
    assert!(!summary.contains(&"s".repeat(40)));
}

#[test]
fn config_summary_reports_generated_secret() {
    let mut config = WarblerConfig::default();
    config.validate().unwrap();
    let summary = render_config_summary(&config);
    assert!(summary.contains("session secret: generated per process"));
    assert!(summary.contains("bind: 127.0.0.1:5000"));
}
