use anyhow::Result;
use appboot_domain::{ManifestSet, ResolutionStrategy, PROJECT_FILE};
use tracing::warn;

use super::{commands, run_step};
use crate::config::BootConfig;
use crate::effects::Effects;
use crate::errors::BootError;
use crate::tooling::BootLog;

/// Installs dependencies with the one strategy the manifests select.
///
/// A rejected frozen sync is retried once without `--frozen` when the
/// fallback is enabled; no other strategy is ever attempted.
///
/// # Errors
///
/// Returns the failing install's [`BootError::StepFailed`] or spawn error.
pub fn resolve_dependencies(
    config: &BootConfig,
    effects: &dyn Effects,
    manifests: ManifestSet,
    log: &mut BootLog,
) -> Result<ResolutionStrategy> {
    let strategy = manifests.strategy();
    log.line(format!("strategy: {strategy} (from {})", strategy.manifest()));
    if strategy == ResolutionStrategy::EditableProjectInstall && !manifests.project {
        log.line(format!(
            "warning: no lock, requirements, or {PROJECT_FILE} found; the editable install will likely fail"
        ));
    }

    let (primary, fallback) = commands::resolution(strategy, config);
    let err = match run_step(effects, log, "install dependencies", &primary) {
        Ok(_) => return Ok(strategy),
        Err(err) => err,
    };

    let rejected = matches!(
        err.downcast_ref::<BootError>(),
        Some(BootError::StepFailed { .. })
    );
    match fallback {
        Some(fallback) if rejected && config.lock_fallback() => {
            warn!(%err, "frozen sync rejected; retrying without --frozen");
            log.line(format!(
                "warning: {err}; the lock may be stale, retrying without --frozen"
            ));
            run_step(effects, log, "install dependencies (unfrozen)", &fallback)?;
            Ok(strategy)
        }
        _ => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::test_support::{read_log, Harness};
    use crate::errors::exit_code_for;
    use appboot_domain::{LOCK_FILE, REQUIREMENTS_FILE};

    #[test]
    fn lock_file_selects_frozen_sync() -> anyhow::Result<()> {
        let harness = Harness::new(&[])?;
        harness.touch(LOCK_FILE)?;
        harness.touch(REQUIREMENTS_FILE)?;
        let config = harness.config()?;

        let mut log = harness.log();
        let manifests = ManifestSet::detect(&harness.project());
        let strategy = resolve_dependencies(&config, &harness.effects, manifests, &mut log)?;
        drop(log);

        assert_eq!(strategy, ResolutionStrategy::LockedSync);
        let lines = harness.effects.call_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("uv sync --frozen --no-dev"), "{}", lines[0]);
        assert!(read_log(&harness)?.contains("strategy: locked_sync (from uv.lock)"));
        Ok(())
    }

    #[test]
    fn requirements_install_when_no_lock() -> anyhow::Result<()> {
        let harness = Harness::new(&[])?;
        harness.touch(REQUIREMENTS_FILE)?;
        let config = harness.config()?;

        let mut log = harness.log();
        let manifests = ManifestSet::detect(&harness.project());
        let strategy = resolve_dependencies(&config, &harness.effects, manifests, &mut log)?;

        assert_eq!(strategy, ResolutionStrategy::RequirementsInstall);
        let lines = harness.effects.call_lines();
        assert!(lines[0].ends_with("-r requirements.txt"), "{}", lines[0]);
        Ok(())
    }

    #[test]
    fn stale_lock_falls_back_to_unfrozen_sync() -> anyhow::Result<()> {
        let harness = Harness::new(&[])?;
        harness.touch(LOCK_FILE)?;
        harness
            .effects
            .respond("--frozen", 1, "", "error: the lockfile needs to be updated\n");
        let config = harness.config()?;

        let mut log = harness.log();
        let manifests = ManifestSet::detect(&harness.project());
        let strategy = resolve_dependencies(&config, &harness.effects, manifests, &mut log)?;
        drop(log);

        assert_eq!(strategy, ResolutionStrategy::LockedSync);
        let lines = harness.effects.call_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("uv sync --no-dev"), "{}", lines[1]);
        let contents = read_log(&harness)?;
        assert!(contents.contains("retrying without --frozen"));
        assert!(contents.contains("the lockfile needs to be updated"));
        Ok(())
    }

    #[test]
    fn disabled_fallback_aborts_on_stale_lock() -> anyhow::Result<()> {
        let harness = Harness::new(&[("APPBOOT_LOCK_FALLBACK", "0")])?;
        harness.touch(LOCK_FILE)?;
        harness.effects.respond("--frozen", 2, "", "");
        let config = harness.config()?;

        let mut log = harness.log();
        let manifests = ManifestSet::detect(&harness.project());
        let err = resolve_dependencies(&config, &harness.effects, manifests, &mut log).unwrap_err();

        assert_eq!(exit_code_for(&err), 2);
        assert_eq!(harness.effects.calls().len(), 1);
        Ok(())
    }

    #[test]
    fn failed_unfrozen_retry_is_final() -> anyhow::Result<()> {
        let harness = Harness::new(&[])?;
        harness.touch(LOCK_FILE)?;
        harness.touch(REQUIREMENTS_FILE)?;
        harness.touch(PROJECT_FILE)?;
        harness.effects.respond("--frozen", 1, "", "lockfile out of date\n");
        harness.effects.respond("sync --no-dev", 4, "", "resolution failed\n");
        let config = harness.config()?;

        let mut log = harness.log();
        let manifests = ManifestSet::detect(&harness.project());
        let err = resolve_dependencies(&config, &harness.effects, manifests, &mut log).unwrap_err();
        drop(log);

        assert_eq!(exit_code_for(&err), 4);
        let lines = harness.effects.call_lines();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines[0].ends_with("uv sync --frozen --no-dev"), "{}", lines[0]);
        assert!(lines[1].ends_with("uv sync --no-dev"), "{}", lines[1]);
        let contents = read_log(&harness)?;
        assert!(contents.contains("resolution failed"));
        assert!(!contents.contains("requirements.txt"));
        Ok(())
    }

    #[test]
    fn requirements_failure_never_switches_strategy() -> anyhow::Result<()> {
        let harness = Harness::new(&[])?;
        harness.touch(REQUIREMENTS_FILE)?;
        harness.touch(PROJECT_FILE)?;
        harness.effects.respond("-r requirements.txt", 1, "", "");
        let config = harness.config()?;

        let mut log = harness.log();
        let manifests = ManifestSet::detect(&harness.project());
        assert!(resolve_dependencies(&config, &harness.effects, manifests, &mut log).is_err());
        assert_eq!(harness.effects.calls().len(), 1);
        Ok(())
    }

    #[test]
    fn spawn_failure_does_not_trigger_fallback() -> anyhow::Result<()> {
        let harness = Harness::new(&[])?;
        harness.touch(LOCK_FILE)?;
        harness.effects.fail_spawn("bin/uv");
        let config = harness.config()?;

        let mut log = harness.log();
        let manifests = ManifestSet::detect(&harness.project());
        let err = resolve_dependencies(&config, &harness.effects, manifests, &mut log).unwrap_err();

        assert_eq!(exit_code_for(&err), 127);
        assert_eq!(harness.effects.calls().len(), 1);
        Ok(())
    }

    #[test]
    fn empty_project_warns_and_attempts_editable_install() -> anyhow::Result<()> {
        let harness = Harness::new(&[])?;
        let config = harness.config()?;

        let mut log = harness.log();
        let strategy =
            resolve_dependencies(&config, &harness.effects, ManifestSet::default(), &mut log)?;
        drop(log);

        assert_eq!(strategy, ResolutionStrategy::EditableProjectInstall);
        assert!(read_log(&harness)?.contains("the editable install will likely fail"));
        Ok(())
    }
}
