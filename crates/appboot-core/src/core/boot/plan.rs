use std::path::PathBuf;

use anyhow::Result;
use appboot_domain::{ManifestSet, NetworkBinding, ResolutionStrategy};
use serde::Serialize;

use super::discovery::observe;
use super::prepare::EnvironmentAction;
use super::{commands, Phase};
use crate::config::{BootConfig, BootOverrides, EnvSnapshot};
use crate::effects::Effects;

/// What `start` would do, computed without running anything.
#[derive(Debug, Clone, Serialize)]
pub struct BootPlan {
    pub project_root: PathBuf,
    pub log_file: PathBuf,
    pub interpreter: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter_error: Option<String>,
    pub environment: PlannedEnvironment,
    pub manifests: ManifestSet,
    pub strategy: ResolutionStrategy,
    pub lock_fallback: bool,
    pub steps: Vec<PlannedStep>,
    pub binding: NetworkBinding,
    pub workers: u32,
    pub timeout_secs: u64,
    pub app: String,
    pub server: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedEnvironment {
    pub path: PathBuf,
    pub action: EnvironmentAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub phase: Phase,
    pub name: &'static str,
    pub command: String,
}

/// Resolves configuration and discovery into the ordered list of commands
/// `start` would run.
///
/// # Errors
///
/// Returns a configuration error for malformed settings.
pub fn plan(
    snapshot: &EnvSnapshot,
    overrides: &BootOverrides,
    effects: &dyn Effects,
) -> Result<BootPlan> {
    let config = BootConfig::from_snapshot(snapshot, overrides)?;
    Ok(plan_for(&config, effects))
}

pub(crate) fn plan_for(config: &BootConfig, effects: &dyn Effects) -> BootPlan {
    let discovery = observe(config, effects);
    let strategy = discovery.manifests.strategy();
    let mut steps = Vec::new();

    let action = match (discovery.environment_exists, discovery.interpreter.as_deref()) {
        (true, _) => EnvironmentAction::Reused,
        (false, Some(interpreter)) => {
            steps.push(PlannedStep {
                phase: Phase::PrepareEnv,
                name: "create environment",
                command: commands::create_environment(interpreter, config).display_line(),
            });
            EnvironmentAction::Created
        }
        (false, None) => EnvironmentAction::Blocked,
    };
    steps.push(PlannedStep {
        phase: Phase::InstallTooling,
        name: "upgrade pip",
        command: commands::upgrade_installer(config).display_line(),
    });
    steps.push(PlannedStep {
        phase: Phase::InstallTooling,
        name: "install uv",
        command: commands::install_package_manager(config).display_line(),
    });
    let (install, _) = commands::resolution(strategy, config);
    steps.push(PlannedStep {
        phase: Phase::ResolveDeps,
        name: "install dependencies",
        command: install.display_line(),
    });
    steps.push(PlannedStep {
        phase: Phase::HealthCheck,
        name: "import application",
        command: commands::health_probe(config).display_line(),
    });
    let server = commands::server(config).display_line();
    steps.push(PlannedStep {
        phase: Phase::Launch,
        name: "start server",
        command: server.clone(),
    });

    BootPlan {
        project_root: config.project_root().to_path_buf(),
        log_file: config.log_file().to_path_buf(),
        interpreter: discovery.interpreter,
        interpreter_error: discovery.interpreter_error,
        environment: PlannedEnvironment {
            path: config.venv().root().to_path_buf(),
            action,
        },
        manifests: discovery.manifests,
        strategy,
        lock_fallback: config.lock_fallback() && strategy == ResolutionStrategy::LockedSync,
        steps,
        binding: config.binding().clone(),
        workers: config.workers().get(),
        timeout_secs: config.timeout_secs(),
        app: config.app().to_string(),
        server,
    }
}
