//! The boot state machine:
//! `discover -> prepare_env -> install_tooling -> resolve_deps -> health_check -> launch`.
//!
//! There are no retry edges. Any error moves straight to the aborted state
//! of the phase that raised it.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use super::discovery::discover;
use super::health::gate;
use super::launch::launch;
use super::prepare::{install_tooling, prepare_environment};
use super::resolve::resolve_dependencies;
use super::Phase;
use crate::config::{BootConfig, BootOverrides, EnvSnapshot};
use crate::effects::Effects;
use crate::errors::exit_code_for;
use crate::tooling::BootLog;

/// How a bootstrap run ended, when it returned at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// The server ran as a child and has exited.
    ServerExited { code: i32 },
    Aborted {
        phase: Phase,
        code: i32,
        message: String,
    },
}

impl LaunchOutcome {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ServerExited { code } | Self::Aborted { code, .. } => *code,
        }
    }
}

/// Runs the full sequence against `effects`, logging each transition.
///
/// Errors never escape: they are logged with the phase that raised them
/// and folded into [`LaunchOutcome::Aborted`].
pub fn bootstrap(
    snapshot: &EnvSnapshot,
    overrides: &BootOverrides,
    effects: &dyn Effects,
    log: &mut BootLog,
) -> LaunchOutcome {
    log.line(format!("=== appboot {} starting ===", crate::APPBOOT_VERSION));
    let mut phase = Phase::Discover;
    let outcome = match run_phases(snapshot, overrides, effects, log, &mut phase) {
        Ok(code) => {
            log.line(format!("server exited with status {code}"));
            LaunchOutcome::ServerExited { code }
        }
        Err(err) => {
            let code = exit_code_for(&err);
            debug!(%phase, code, "boot aborted: {err:#}");
            log.line(format!("aborted in {phase}: {err:#}"));
            LaunchOutcome::Aborted {
                phase,
                code,
                message: format!("{err:#}"),
            }
        }
    };
    log.flush();
    outcome
}

fn run_phases(
    snapshot: &EnvSnapshot,
    overrides: &BootOverrides,
    effects: &dyn Effects,
    log: &mut BootLog,
    phase: &mut Phase,
) -> Result<i32> {
    enter(log, phase, Phase::Discover);
    let config = BootConfig::from_snapshot(snapshot, overrides)?;
    let discovery = discover(&config, effects, log);

    enter(log, phase, Phase::PrepareEnv);
    prepare_environment(&config, effects, &discovery, log)?;

    enter(log, phase, Phase::InstallTooling);
    install_tooling(&config, effects, log)?;

    enter(log, phase, Phase::ResolveDeps);
    let strategy = resolve_dependencies(&config, effects, discovery.manifests, log)?;

    enter(log, phase, Phase::HealthCheck);
    gate(&config, effects, strategy, log)?;

    // No phase line here: the success marker must be followed directly by
    // the server start line.
    *phase = Phase::Launch;
    launch(&config, effects, log)
}

fn enter(log: &mut BootLog, current: &mut Phase, next: Phase) {
    *current = next;
    debug!(phase = %next, "entering phase");
    log.line(format!("phase: {next}"));
}
