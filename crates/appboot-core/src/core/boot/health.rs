use anyhow::{Context, Result};
use appboot_domain::ResolutionStrategy;
use serde::Serialize;
use tracing::debug;

use super::commands;
use crate::config::BootConfig;
use crate::effects::Effects;
use crate::errors::BootError;
use crate::runtime::traceback::{analyze_python_traceback, TracebackReport};
use crate::tooling::BootLog;

/// Result of importing the application inside the environment.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub module: String,
    pub passed: bool,
    pub code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<TracebackReport>,
}

impl HealthReport {
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        self.traceback.as_ref().map(TracebackReport::summary)
    }
}

/// Imports the application module with the environment's interpreter.
///
/// An import failure is reported through [`HealthReport::passed`], not as an
/// error; `strategy` tailors the hint attached to a missing dependency.
///
/// # Errors
///
/// Fails only when the interpreter cannot be started.
pub fn run_health_check(
    config: &BootConfig,
    effects: &dyn Effects,
    strategy: Option<ResolutionStrategy>,
) -> Result<HealthReport> {
    let probe = commands::health_probe(config);
    debug!(module = config.app().module(), "probing application import");
    let output = effects
        .process()
        .run(&probe)
        .with_context(|| format!("failed to run the health check for {}", config.app()))?;
    let passed = output.success();
    let traceback = if passed {
        None
    } else {
        analyze_python_traceback(&output.stderr, strategy)
    };
    Ok(HealthReport {
        module: config.app().module().to_string(),
        passed,
        code: output.code,
        stdout: output.stdout,
        stderr: output.stderr,
        traceback,
    })
}

/// Runs the health check and logs its verdict. A failed import has its full
/// stderr appended to the log and becomes [`BootError::HealthCheck`].
pub(crate) fn gate(
    config: &BootConfig,
    effects: &dyn Effects,
    strategy: ResolutionStrategy,
    log: &mut BootLog,
) -> Result<HealthReport> {
    log.line(format!("health check: importing {}", config.app()));
    let report = run_health_check(config, effects, Some(strategy))?;
    if report.passed {
        log.line(format!("health check passed: {}", report.module));
        return Ok(report);
    }

    log.line(format!(
        "health check failed: {} exited with status {}",
        report.module, report.code
    ));
    log.raw_echoed(&report.stdout);
    log.raw_echoed(&report.stderr);
    if let Some(hint) = report.traceback.as_ref().and_then(|tb| tb.hint.as_ref()) {
        log.line(format!("hint: {}", hint.hint));
    }
    Err(BootError::HealthCheck {
        summary: report.summary(),
        module: report.module,
    }
    .into())
}
