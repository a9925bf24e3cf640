use appboot_core::{
    bootstrap, exit_code_for, observe, resolve_log_file, run_health_check, BootConfig, BootLog,
    BootOverrides, EnvSnapshot, ExecutionOutcome, LaunchOutcome, SystemEffects,
};
use atty::Stream;
use clap::Parser;
use color_eyre::Result;
use serde_json::json;

mod cli;
mod output;
mod style;
mod traceback;

use cli::{AppbootCli, CommandCli};
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = AppbootCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let snapshot = EnvSnapshot::capture();
    let overrides = cli.overrides();
    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    let code = match cli.command {
        CommandCli::Start => start(&cli, &style, &snapshot, &overrides)?,
        CommandCli::Plan => plan(&cli, &style, &snapshot, &overrides)?,
        CommandCli::Check => check(&cli, &style, &snapshot, &overrides)?,
    };

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("appboot={level},appboot_core={level},appboot_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn start(
    cli: &AppbootCli,
    style: &Style,
    snapshot: &EnvSnapshot,
    overrides: &BootOverrides,
) -> Result<i32> {
    // The log opens before anything is validated so every failure lands in it.
    let mut log = BootLog::open(&resolve_log_file(snapshot, overrides), !cli.quiet);
    let effects = SystemEffects::new();
    let outcome = bootstrap(snapshot, overrides, &effects, &mut log);

    let code = outcome.exit_code();
    let details = json!({
        "outcome": &outcome,
        "log_file": log.path(),
        "log_persisted": log.is_persistent(),
    });
    let result = match &outcome {
        LaunchOutcome::ServerExited { code } => {
            ExecutionOutcome::success(format!("server exited with status {code}"), details)
        }
        LaunchOutcome::Aborted { phase, message, .. } => {
            ExecutionOutcome::failure(format!("aborted in {phase}: {message}"), details)
        }
    };
    // The boot log already mirrored every line to stderr.
    if cli.json || cli.quiet {
        output::emit(cli, style, &result, None, code)?;
    }
    Ok(code)
}

fn plan(
    cli: &AppbootCli,
    style: &Style,
    snapshot: &EnvSnapshot,
    overrides: &BootOverrides,
) -> Result<i32> {
    let effects = SystemEffects::new();
    let (outcome, body, code) = match appboot_core::plan(snapshot, overrides, &effects) {
        Ok(plan) => {
            let body = output::render_plan(style, &plan);
            let outcome = ExecutionOutcome::success(
                format!("boot plan for {}", plan.project_root.display()),
                serde_json::to_value(&plan)?,
            );
            (outcome, Some(body), 0)
        }
        Err(err) => (
            ExecutionOutcome::user_error(format!("{err:#}"), json!({})),
            None,
            exit_code_for(&err),
        ),
    };
    output::emit(cli, style, &outcome, body, code)?;
    Ok(code)
}

fn check(
    cli: &AppbootCli,
    style: &Style,
    snapshot: &EnvSnapshot,
    overrides: &BootOverrides,
) -> Result<i32> {
    let effects = SystemEffects::new();
    let config = match BootConfig::from_snapshot(snapshot, overrides) {
        Ok(config) => config,
        Err(err) => {
            let outcome = ExecutionOutcome::user_error(format!("{err:#}"), json!({}));
            let code = exit_code_for(&err);
            output::emit(cli, style, &outcome, None, code)?;
            return Ok(code);
        }
    };

    let discovery = observe(&config, &effects);
    if !discovery.environment_exists {
        let outcome = ExecutionOutcome::user_error(
            format!("no environment at {}", config.venv().root().display()),
            json!({ "hint": "run `appboot start` to create it" }),
        );
        output::emit(cli, style, &outcome, None, 1)?;
        return Ok(1);
    }

    let strategy = discovery.manifests.strategy();
    let (outcome, body, code) = match run_health_check(&config, &effects, Some(strategy)) {
        Ok(report) if report.passed => (
            ExecutionOutcome::success(
                format!("{} imported", config.app()),
                serde_json::to_value(&report)?,
            ),
            None,
            0,
        ),
        Ok(report) => {
            let message = match report.summary() {
                Some(summary) => format!("{} failed to import: {summary}", config.app()),
                None => format!(
                    "{} failed to import (exit status {})",
                    config.app(),
                    report.code
                ),
            };
            (
                ExecutionOutcome::failure(message, serde_json::to_value(&report)?),
                output::render_check(style, &report),
                1,
            )
        }
        Err(err) => (
            ExecutionOutcome::failure(format!("{err:#}"), json!({})),
            None,
            exit_code_for(&err),
        ),
    };
    output::emit(cli, style, &outcome, body, code)?;
    Ok(code)
}
