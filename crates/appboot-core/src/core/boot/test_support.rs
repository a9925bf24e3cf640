use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tempfile::TempDir;

use crate::config::{BootConfig, BootOverrides, EnvSnapshot};
use crate::effects::{Effects, FileSystem, ProcessRunner, PythonRuntime};
use crate::errors::BootError;
use crate::runtime::{CommandSpec, RunOutput};
use crate::tooling::BootLog;

/// Records every command and answers from canned responses. A response
/// applies when its pattern occurs in the command's display line; the first
/// registered match wins and unmatched commands succeed silently.
pub(crate) struct FakeEffects {
    interpreter: Mutex<Option<PathBuf>>,
    responses: Mutex<Vec<(String, RunOutput)>>,
    spawn_failures: Mutex<Vec<String>>,
    calls: Mutex<Vec<CommandSpec>>,
    handoffs: Mutex<Vec<CommandSpec>>,
}

impl FakeEffects {
    pub(crate) fn new() -> Self {
        Self {
            interpreter: Mutex::new(Some(PathBuf::from("/usr/bin/python3"))),
            responses: Mutex::new(Vec::new()),
            spawn_failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            handoffs: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_interpreter(&self, path: Option<&str>) {
        *self.interpreter.lock().expect("lock") = path.map(PathBuf::from);
    }

    pub(crate) fn respond(&self, pattern: &str, code: i32, stdout: &str, stderr: &str) {
        self.responses.lock().expect("lock").push((
            pattern.to_string(),
            RunOutput {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        ));
    }

    pub(crate) fn fail_spawn(&self, pattern: &str) {
        self.spawn_failures
            .lock()
            .expect("lock")
            .push(pattern.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().expect("lock").clone()
    }

    pub(crate) fn call_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(CommandSpec::display_line)
            .collect()
    }

    pub(crate) fn handoffs(&self) -> Vec<CommandSpec> {
        self.handoffs.lock().expect("lock").clone()
    }

    fn answer(&self, command: &CommandSpec) -> Result<RunOutput> {
        let line = command.display_line();
        self.calls.lock().expect("lock").push(command.clone());
        let spawn_fails = self
            .spawn_failures
            .lock()
            .expect("lock")
            .iter()
            .any(|pattern| line.contains(pattern.as_str()));
        if spawn_fails {
            return Err(anyhow!("No such file or directory").context(BootError::Spawn {
                program: command.program.display().to_string(),
            }));
        }
        let responses = self.responses.lock().expect("lock");
        Ok(responses
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default())
    }
}

impl PythonRuntime for FakeEffects {
    fn detect_interpreter(
        &self,
        explicit: Option<&str>,
        _search_path: Option<&str>,
        _cwd: &Path,
    ) -> Result<PathBuf> {
        if let Some(explicit) = explicit {
            return Ok(PathBuf::from(explicit));
        }
        self.interpreter
            .lock()
            .expect("lock")
            .clone()
            .ok_or_else(|| anyhow!("no python interpreter found on PATH; set APPBOOT_PYTHON"))
    }
}

impl ProcessRunner for FakeEffects {
    fn run(&self, command: &CommandSpec) -> Result<RunOutput> {
        self.answer(command)
    }

    fn run_streaming(&self, command: &CommandSpec) -> Result<RunOutput> {
        self.answer(command)
    }

    fn hand_off(&self, command: &CommandSpec) -> Result<i32> {
        self.handoffs.lock().expect("lock").push(command.clone());
        Ok(0)
    }
}

impl FileSystem for FakeEffects {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

impl Effects for FakeEffects {
    fn python(&self) -> &dyn PythonRuntime {
        self
    }

    fn process(&self) -> &dyn ProcessRunner {
        self
    }

    fn fs(&self) -> &dyn FileSystem {
        self
    }
}

/// A throwaway project directory, log file, and fake effects.
pub(crate) struct Harness {
    temp: TempDir,
    pairs: Vec<(String, String)>,
    pub(crate) effects: FakeEffects,
}

impl Harness {
    pub(crate) fn new(pairs: &[(&str, &str)]) -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("appboot-").tempdir()?;
        fs::create_dir_all(temp.path().join("project"))?;
        Ok(Self {
            temp,
            pairs: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            effects: FakeEffects::new(),
        })
    }

    pub(crate) fn project(&self) -> PathBuf {
        self.temp.path().join("project")
    }

    pub(crate) fn log_path(&self) -> PathBuf {
        self.temp.path().join("logs").join("startup.log")
    }

    pub(crate) fn snapshot(&self) -> EnvSnapshot {
        let pairs: Vec<(&str, &str)> = self
            .pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        EnvSnapshot::testing(&pairs)
    }

    pub(crate) fn overrides(&self) -> BootOverrides {
        BootOverrides {
            project: Some(self.project()),
            log_file: Some(self.log_path()),
            ..BootOverrides::default()
        }
    }

    pub(crate) fn config(&self) -> Result<BootConfig> {
        BootConfig::from_snapshot_in(&self.snapshot(), &self.overrides(), &self.project())
    }

    pub(crate) fn log(&self) -> BootLog {
        BootLog::open(&self.log_path(), false)
    }

    pub(crate) fn touch(&self, name: &str) -> Result<()> {
        fs::write(self.project().join(name), "")
            .with_context(|| format!("failed to create {name}"))
    }

    pub(crate) fn create_env(&self) -> Result<()> {
        fs::create_dir_all(self.project().join(".venv").join("bin"))?;
        Ok(())
    }
}

pub(crate) fn read_log(harness: &Harness) -> Result<String> {
    fs::read_to_string(harness.log_path()).context("read boot log")
}

/// Log lines with the `[timestamp] ` prefix removed.
pub(crate) fn log_messages(harness: &Harness) -> Result<Vec<String>> {
    Ok(read_log(harness)?
        .lines()
        .filter_map(|line| {
            line.strip_prefix('[')
                .and_then(|rest| rest.split_once("] "))
                .map(|(_, message)| message.to_string())
        })
        .collect())
}
