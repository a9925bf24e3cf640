use anyhow::Result;
use serde::Serialize;

use super::discovery::Discovery;
use super::{commands, run_step};
use crate::config::BootConfig;
use crate::effects::Effects;
use crate::errors::BootError;
use crate::tooling::BootLog;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentAction {
    Created,
    Reused,
    /// Absent, with no interpreter to create it. Only `plan` reports this;
    /// `start` aborts instead.
    Blocked,
}

/// Creates the runtime environment unless it already exists.
///
/// # Errors
///
/// Fails when creation is needed but no interpreter was discovered, or when
/// the creation command fails.
pub fn prepare_environment(
    config: &BootConfig,
    effects: &dyn Effects,
    discovery: &Discovery,
    log: &mut BootLog,
) -> Result<EnvironmentAction> {
    let root = config.venv().root();
    if effects.fs().is_dir(root) {
        log.line(format!("environment exists, reusing {}", root.display()));
        return Ok(EnvironmentAction::Reused);
    }
    let Some(interpreter) = discovery.interpreter.as_deref() else {
        return Err(BootError::MissingInterpreter {
            venv: root.display().to_string(),
        }
        .into());
    };
    run_step(
        effects,
        log,
        "create environment",
        &commands::create_environment(interpreter, config),
    )?;
    log.line(format!("environment created at {}", root.display()));
    Ok(EnvironmentAction::Created)
}

/// Upgrades pip inside the environment and installs the package manager.
/// Runs on every boot, including when the environment was reused.
pub fn install_tooling(config: &BootConfig, effects: &dyn Effects, log: &mut BootLog) -> Result<()> {
    run_step(effects, log, "upgrade pip", &commands::upgrade_installer(config))?;
    run_step(
        effects,
        log,
        "install uv",
        &commands::install_package_manager(config),
    )?;
    Ok(())
}
