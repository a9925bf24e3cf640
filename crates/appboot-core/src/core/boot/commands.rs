//! Builders for every subprocess the boot sequence can run.

use std::path::Path;

use appboot_domain::{ResolutionStrategy, REQUIREMENTS_FILE};

use crate::config::BootConfig;
use crate::runtime::CommandSpec;

pub(crate) const PACKAGE_MANAGER: &str = "uv";
pub(crate) const SERVER: &str = "gunicorn";
pub(crate) const WORKER_CLASS: &str = "uvicorn.workers.UvicornWorker";

/// Imports the application module, then checks the application object
/// exists. Exits 1 with the traceback on stderr on any failure.
pub(crate) const PROBE_SCRIPT: &str = r#"import importlib, sys, traceback
module_name, object_name = sys.argv[1], sys.argv[2]
try:
    module = importlib.import_module(module_name)
except BaseException:
    traceback.print_exc()
    sys.exit(1)
if not hasattr(module, object_name):
    print(f"AttributeError: module '{module_name}' has no attribute '{object_name}'", file=sys.stderr)
    sys.exit(1)
print(f"imported {module_name}:{object_name}")
"#;

pub(crate) fn interpreter_version(interpreter: &Path, cwd: &Path) -> CommandSpec {
    CommandSpec::new(interpreter, cwd).arg("--version")
}

pub(crate) fn create_environment(interpreter: &Path, config: &BootConfig) -> CommandSpec {
    CommandSpec::new(interpreter, config.project_root())
        .args(["-m", "venv"])
        .arg(config.venv().root().display().to_string())
}

pub(crate) fn upgrade_installer(config: &BootConfig) -> CommandSpec {
    CommandSpec::new(config.venv().python(), config.project_root())
        .args(["-m", "pip", "install", "--upgrade", "pip"])
}

pub(crate) fn install_package_manager(config: &BootConfig) -> CommandSpec {
    CommandSpec::new(config.venv().python(), config.project_root()).args([
        "-m",
        "pip",
        "install",
        PACKAGE_MANAGER,
    ])
}

/// The install command for `strategy`, plus the non-frozen retry used when
/// a locked sync is rejected.
pub(crate) fn resolution(
    strategy: ResolutionStrategy,
    config: &BootConfig,
) -> (CommandSpec, Option<CommandSpec>) {
    let venv = config.venv();
    let uv = CommandSpec::new(venv.executable(PACKAGE_MANAGER), config.project_root());
    let venv_python = venv.python().display().to_string();
    match strategy {
        ResolutionStrategy::LockedSync => {
            let sync = uv
                .env("UV_PROJECT_ENVIRONMENT", venv.root().display().to_string())
                .arg("sync");
            let frozen = sync.clone().args(["--frozen", "--no-dev"]);
            let fallback = sync.arg("--no-dev");
            (frozen, Some(fallback))
        }
        ResolutionStrategy::RequirementsInstall => (
            uv.args(["pip", "install", "--python"])
                .arg(venv_python)
                .args(["-r", REQUIREMENTS_FILE]),
            None,
        ),
        ResolutionStrategy::EditableProjectInstall => (
            uv.args(["pip", "install", "--python"])
                .arg(venv_python)
                .args(["-e", "."]),
            None,
        ),
    }
}

pub(crate) fn health_probe(config: &BootConfig) -> CommandSpec {
    CommandSpec::new(config.venv().python(), config.project_root())
        .arg("-c")
        .arg(PROBE_SCRIPT)
        .arg(config.app().module())
        .arg(config.app().object())
}

pub(crate) fn server(config: &BootConfig) -> CommandSpec {
    CommandSpec::new(config.venv().executable(SERVER), config.project_root())
        .arg(config.app().to_string())
        .args(["-k", WORKER_CLASS, "--bind"])
        .arg(config.binding().address())
        .arg("--workers")
        .arg(config.workers().to_string())
        .arg("--timeout")
        .arg(config.timeout_secs().to_string())
        .args(["--access-logfile", "-", "--error-logfile", "-"])
}
