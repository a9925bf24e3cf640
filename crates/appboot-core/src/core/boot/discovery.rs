use std::path::PathBuf;

use appboot_domain::ManifestSet;
use tracing::debug;

use super::commands;
use crate::config::BootConfig;
use crate::effects::Effects;
use crate::tooling::BootLog;

const UNSET: &str = "unset";

/// What discovery learned. Missing values are recorded, never fatal.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub interpreter: Option<PathBuf>,
    pub interpreter_error: Option<String>,
    pub interpreter_version: Option<String>,
    pub environment_exists: bool,
    pub manifests: ManifestSet,
}

/// Side-effect free observation: interpreter lookup, environment and
/// manifest presence.
pub fn observe(config: &BootConfig, effects: &dyn Effects) -> Discovery {
    let (interpreter, interpreter_error) = match effects.python().detect_interpreter(
        config.explicit_python(),
        config.search_path(),
        config.project_root(),
    ) {
        Ok(path) => (Some(path), None),
        Err(err) => (None, Some(format!("{err:#}"))),
    };
    let fs = effects.fs();
    let root = config.project_root();
    Discovery {
        interpreter,
        interpreter_error,
        interpreter_version: None,
        environment_exists: fs.is_dir(config.venv().root()),
        manifests: ManifestSet::detect_with(root, |path| fs.is_file(path)),
    }
}

/// Observes, queries the interpreter version, and logs everything later
/// phases will rely on.
pub fn discover(config: &BootConfig, effects: &dyn Effects, log: &mut BootLog) -> Discovery {
    let mut discovery = observe(config, effects);

    log.line(format!("project: {}", config.project_root().display()));
    match (&discovery.interpreter, &discovery.interpreter_error) {
        (Some(path), _) => {
            log.line(format!("python: {}", path.display()));
            discovery.interpreter_version = query_version(effects, path, config);
            log.line(format!(
                "python version: {}",
                discovery.interpreter_version.as_deref().unwrap_or(UNSET)
            ));
        }
        (None, reason) => {
            log.line(format!("python: {UNSET}"));
            if let Some(reason) = reason {
                log.line(format!("python lookup: {reason}"));
            }
        }
    }

    for (name, value) in config.observed() {
        log.line(format!("{name}={}", value.as_deref().unwrap_or(UNSET)));
    }
    log.line(format!("bind: {} (from {})", config.binding(), config.binding().source().as_str()));
    log.line(format!(
        "environment: {} ({})",
        config.venv().root().display(),
        if discovery.environment_exists { "exists" } else { "absent" }
    ));
    discovery
}

fn query_version(
    effects: &dyn Effects,
    interpreter: &std::path::Path,
    config: &BootConfig,
) -> Option<String> {
    let command = commands::interpreter_version(interpreter, config.project_root());
    match effects.process().run(&command) {
        Ok(output) if output.success() => {
            // Python 2 and some builds print the version on stderr.
            let text = if output.stdout.trim().is_empty() {
                output.stderr
            } else {
                output.stdout
            };
            let version = text.trim().to_string();
            (!version.is_empty()).then_some(version)
        }
        Ok(output) => {
            debug!(code = output.code, "interpreter version query failed");
            None
        }
        Err(err) => {
            debug!(%err, "interpreter version query could not run");
            None
        }
    }
}
