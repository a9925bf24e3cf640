use std::fmt::Write as _;

use appboot_core::{BootPlan, CommandStatus, EnvironmentAction, ExecutionOutcome, HealthReport};
use color_eyre::Result;
use serde_json::Value;

use crate::cli::AppbootCli;
use crate::style::Style;
use crate::traceback::format_traceback;

/// Prints `outcome` as a JSON envelope or a styled status line, followed by
/// the pre-rendered `body` in human mode.
pub fn emit(
    cli: &AppbootCli,
    style: &Style,
    outcome: &ExecutionOutcome,
    body: Option<String>,
    code: i32,
) -> Result<()> {
    if cli.json {
        let payload = appboot_core::to_json_response(cli.command.name(), outcome, code);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if cli.quiet {
        if outcome.status != CommandStatus::Ok {
            eprintln!("{}", outcome.message);
        }
        return Ok(());
    }
    println!("{}", style.status(outcome.status, &outcome.message));
    if let Some(body) = body {
        println!("{body}");
    }
    if let Some(hint) = hint_from_details(&outcome.details) {
        println!("{}", style.info(&format!("Hint: {hint}")));
    }
    Ok(())
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

pub fn render_plan(style: &Style, plan: &BootPlan) -> String {
    let mut out = String::new();
    let row = |out: &mut String, label: &str, value: &str| {
        let _ = writeln!(out, "  {} {value}", style.label(&format!("{label:<12}")));
    };

    row(&mut out, "project", &plan.project_root.display().to_string());
    row(&mut out, "log file", &plan.log_file.display().to_string());
    let python = match (&plan.interpreter, &plan.interpreter_error) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(reason)) => format!("unset ({reason})"),
        (None, None) => "unset".to_string(),
    };
    row(&mut out, "python", &python);
    let action = match plan.environment.action {
        EnvironmentAction::Created => "create",
        EnvironmentAction::Reused => "reuse",
        EnvironmentAction::Blocked => "blocked: no interpreter to create it",
    };
    row(
        &mut out,
        "environment",
        &format!("{} ({action})", plan.environment.path.display()),
    );
    let fallback = if plan.lock_fallback {
        ", unfrozen retry enabled"
    } else {
        ""
    };
    row(
        &mut out,
        "strategy",
        &format!("{} (from {}{fallback})", plan.strategy, plan.strategy.manifest()),
    );
    row(
        &mut out,
        "bind",
        &format!("{} (from {})", plan.binding, plan.binding.source().as_str()),
    );
    row(&mut out, "workers", &plan.workers.to_string());
    row(&mut out, "timeout", &format!("{}s", plan.timeout_secs));
    row(&mut out, "app", &plan.app);

    let _ = writeln!(out, "{}", style.label("steps"));
    for (idx, step) in plan.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. [{}] {}", idx + 1, step.phase, step.name);
        let _ = writeln!(out, "{}", style.command(&step.command));
    }
    out.trim_end().to_string()
}

pub fn render_check(style: &Style, report: &HealthReport) -> Option<String> {
    if report.passed {
        return None;
    }
    match &report.traceback {
        Some(traceback) => {
            let display = format_traceback(style, traceback);
            Some(match display.hint_line {
                Some(hint) => format!("{}\n{hint}", display.body),
                None => display.body,
            })
        }
        None if !report.stderr.trim().is_empty() => Some(report.stderr.trim_end().to_string()),
        None => None,
    }
}
