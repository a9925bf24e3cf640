use std::collections::HashMap;
use std::env;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use appboot_domain::{parse_timeout, parse_workers, AppTarget, NetworkBinding};
use appboot_python::VenvLayout;

use crate::errors::BootError;

pub const DEFAULT_LOG_FILE: &str = "/home/LogFiles/startup.log";
pub const DEFAULT_VENV_DIR: &str = ".venv";

/// Variables reported during discovery, in the order they are logged.
pub const OBSERVED_VARS: [&str; 5] = ["PORT", "WEBSITES_PORT", "WORKERS", "HOST", "TIMEOUT"];

/// The process environment, captured once.
#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    #[must_use]
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`Self::var`], but empty or whitespace-only values read as unset.
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.var(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn flag_is_disabled(&self, key: &str) -> bool {
        self.non_empty(key).is_some_and(|value| {
            matches!(
                value.to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            )
        })
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct BootOverrides {
    pub project: Option<PathBuf>,
    pub venv: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub python: Option<String>,
    pub app: Option<String>,
    pub no_lock_fallback: bool,
}

/// Resolves the boot log location. This never fails so the log can be
/// opened before anything else is validated.
#[must_use]
pub fn resolve_log_file(snapshot: &EnvSnapshot, overrides: &BootOverrides) -> PathBuf {
    overrides
        .log_file
        .clone()
        .or_else(|| snapshot.non_empty("APPBOOT_LOG_FILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Immutable settings for one bootstrap run.
#[derive(Debug, Clone)]
pub struct BootConfig {
    project_root: PathBuf,
    venv: VenvLayout,
    log_file: PathBuf,
    explicit_python: Option<String>,
    app: AppTarget,
    binding: NetworkBinding,
    workers: NonZeroU32,
    timeout_secs: u64,
    lock_fallback: bool,
    observed: Vec<(&'static str, Option<String>)>,
    search_path: Option<String>,
}

impl BootConfig {
    /// Builds the configuration from a snapshot.
    ///
    /// # Errors
    /// Returns [`BootError::Config`] when a variable or flag is set to a
    /// malformed value, or when the working directory cannot be read.
    pub fn from_snapshot(snapshot: &EnvSnapshot, overrides: &BootOverrides) -> Result<Self> {
        let cwd = env::current_dir().context("failed to read the current directory")?;
        Self::from_snapshot_in(snapshot, overrides, &cwd)
    }

    pub(crate) fn from_snapshot_in(
        snapshot: &EnvSnapshot,
        overrides: &BootOverrides,
        cwd: &Path,
    ) -> Result<Self> {
        let project_root = match &overrides.project {
            Some(project) => absolutize(cwd, project),
            None => cwd.to_path_buf(),
        };
        let venv_dir = overrides
            .venv
            .clone()
            .or_else(|| snapshot.non_empty("APPBOOT_VENV").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VENV_DIR));
        let venv = VenvLayout::new(absolutize(&project_root, &venv_dir));

        let app_raw = overrides
            .app
            .as_deref()
            .or_else(|| snapshot.non_empty("APPBOOT_APP"));
        let app = match app_raw {
            Some(raw) => AppTarget::parse(raw).map_err(BootError::config)?,
            None => AppTarget::default(),
        };

        let binding = NetworkBinding::resolve(
            snapshot.var("HOST"),
            snapshot.var("PORT"),
            snapshot.var("WEBSITES_PORT"),
        )
        .map_err(BootError::config)?;
        let workers = parse_workers(snapshot.var("WORKERS")).map_err(BootError::config)?;
        let timeout_secs = parse_timeout(snapshot.var("TIMEOUT")).map_err(BootError::config)?;

        let lock_fallback =
            !(overrides.no_lock_fallback || snapshot.flag_is_disabled("APPBOOT_LOCK_FALLBACK"));

        let observed = OBSERVED_VARS
            .iter()
            .map(|name| (*name, snapshot.non_empty(name).map(ToOwned::to_owned)))
            .collect();

        Ok(Self {
            project_root,
            venv,
            log_file: resolve_log_file(snapshot, overrides),
            explicit_python: overrides
                .python
                .clone()
                .or_else(|| snapshot.non_empty("APPBOOT_PYTHON").map(ToOwned::to_owned)),
            app,
            binding,
            workers,
            timeout_secs,
            lock_fallback,
            observed,
            search_path: snapshot.var("PATH").map(ToOwned::to_owned),
        })
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    #[must_use]
    pub fn venv(&self) -> &VenvLayout {
        &self.venv
    }

    #[must_use]
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    #[must_use]
    pub fn explicit_python(&self) -> Option<&str> {
        self.explicit_python.as_deref()
    }

    #[must_use]
    pub fn app(&self) -> &AppTarget {
        &self.app
    }

    #[must_use]
    pub fn binding(&self) -> &NetworkBinding {
        &self.binding
    }

    #[must_use]
    pub fn workers(&self) -> NonZeroU32 {
        self.workers
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    #[must_use]
    pub fn lock_fallback(&self) -> bool {
        self.lock_fallback
    }

    /// Raw values of the networking variables, `None` when unset.
    #[must_use]
    pub fn observed(&self) -> &[(&'static str, Option<String>)] {
        &self.observed
    }

    /// The captured `PATH`, used for interpreter discovery.
    #[must_use]
    pub fn search_path(&self) -> Option<&str> {
        self.search_path.as_deref()
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)], overrides: &BootOverrides) -> Result<BootConfig> {
        BootConfig::from_snapshot_in(
            &EnvSnapshot::testing(pairs),
            overrides,
            Path::new("/srv/site"),
        )
    }

    #[test]
    fn defaults_without_environment() -> Result<()> {
        let config = config(&[], &BootOverrides::default())?;
        assert_eq!(config.project_root(), Path::new("/srv/site"));
        assert_eq!(config.venv().root(), Path::new("/srv/site/.venv"));
        assert_eq!(config.log_file(), Path::new(DEFAULT_LOG_FILE));
        assert_eq!(config.binding().port(), 8000);
        assert_eq!(config.workers().get(), 1);
        assert_eq!(config.timeout_secs(), 600);
        assert_eq!(config.app().to_string(), "app.main:app");
        assert!(config.lock_fallback());
        assert!(config.observed().iter().all(|(_, value)| value.is_none()));
        Ok(())
    }

    #[test]
    fn reads_binding_and_workers_from_snapshot() -> Result<()> {
        let config = config(
            &[("PORT", "7000"), ("WEBSITES_PORT", "9000"), ("WORKERS", "3")],
            &BootOverrides::default(),
        )?;
        assert_eq!(config.binding().port(), 7000);
        assert_eq!(config.workers().get(), 3);
        let observed: Vec<_> = config
            .observed()
            .iter()
            .map(|(name, value)| (*name, value.as_deref()))
            .collect();
        assert_eq!(observed[0], ("PORT", Some("7000")));
        assert_eq!(observed[1], ("WEBSITES_PORT", Some("9000")));
        assert_eq!(observed[3], ("HOST", None));
        Ok(())
    }

    #[test]
    fn overrides_beat_environment() -> Result<()> {
        let overrides = BootOverrides {
            project: Some(PathBuf::from("app")),
            venv: Some(PathBuf::from("/opt/venv")),
            log_file: Some(PathBuf::from("/tmp/boot.log")),
            python: Some("/usr/bin/python3.12".into()),
            app: Some("service.asgi:api".into()),
            no_lock_fallback: true,
        };
        let config = config(
            &[
                ("APPBOOT_VENV", "other"),
                ("APPBOOT_LOG_FILE", "/var/log/x.log"),
                ("APPBOOT_PYTHON", "python3.11"),
                ("APPBOOT_APP", "other:app"),
            ],
            &overrides,
        )?;
        assert_eq!(config.project_root(), Path::new("/srv/site/app"));
        assert_eq!(config.venv().root(), Path::new("/opt/venv"));
        assert_eq!(config.log_file(), Path::new("/tmp/boot.log"));
        assert_eq!(config.explicit_python(), Some("/usr/bin/python3.12"));
        assert_eq!(config.app().module(), "service.asgi");
        assert!(!config.lock_fallback());
        Ok(())
    }

    #[test]
    fn relative_venv_resolves_against_project_root() -> Result<()> {
        let overrides = BootOverrides {
            project: Some(PathBuf::from("/home/site/wwwroot")),
            ..BootOverrides::default()
        };
        let config = config(&[("APPBOOT_VENV", "antenv")], &overrides)?;
        assert_eq!(config.venv().root(), Path::new("/home/site/wwwroot/antenv"));
        Ok(())
    }

    #[test]
    fn lock_fallback_can_be_disabled_from_environment() -> Result<()> {
        for value in ["0", "false", "OFF", "no"] {
            let config = config(&[("APPBOOT_LOCK_FALLBACK", value)], &BootOverrides::default())?;
            assert!(!config.lock_fallback(), "{value} should disable fallback");
        }
        let config = config(&[("APPBOOT_LOCK_FALLBACK", "1")], &BootOverrides::default())?;
        assert!(config.lock_fallback());
        Ok(())
    }

    #[test]
    fn malformed_values_are_config_errors() {
        for pairs in [
            [("PORT", "eighty")],
            [("WORKERS", "0")],
            [("TIMEOUT", "soon")],
            [("APPBOOT_APP", ":app")],
        ] {
            let err = config(&pairs, &BootOverrides::default()).unwrap_err();
            let boot = err.downcast_ref::<BootError>().expect("boot error");
            assert_eq!(boot.exit_code(), 2, "{pairs:?}");
        }
    }

    #[test]
    fn log_file_resolves_without_validation() {
        let snapshot = EnvSnapshot::testing(&[("APPBOOT_LOG_FILE", "/tmp/a.log"), ("PORT", "x")]);
        assert_eq!(
            resolve_log_file(&snapshot, &BootOverrides::default()),
            PathBuf::from("/tmp/a.log")
        );
    }
}
