use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::effects::Effects;
use crate::errors::BootError;
use crate::runtime::{CommandSpec, RunOutput};
use crate::tooling::BootLog;

pub(crate) mod commands;
pub mod discovery;
pub mod health;
pub mod launch;
pub mod plan;
pub mod prepare;
pub mod resolve;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod test_support;

/// States of the boot sequence, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discover,
    PrepareEnv,
    InstallTooling,
    ResolveDeps,
    HealthCheck,
    Launch,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::PrepareEnv => "prepare_env",
            Self::InstallTooling => "install_tooling",
            Self::ResolveDeps => "resolve_deps",
            Self::HealthCheck => "health_check",
            Self::Launch => "launch",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs one step with streamed output, appends the capture to the log, and
/// turns a non-zero exit into [`BootError::StepFailed`].
pub(crate) fn run_step(
    effects: &dyn Effects,
    log: &mut BootLog,
    step: &str,
    command: &CommandSpec,
) -> Result<RunOutput> {
    log.line(format!("{step}: {}", command.display_line()));
    let output = effects.process().run_streaming(command)?;
    log.raw(&output.stdout);
    log.raw(&output.stderr);
    if !output.success() {
        return Err(BootError::StepFailed {
            step: step.to_string(),
            program: command.program_name(),
            code: output.code,
        }
        .into());
    }
    Ok(output)
}
