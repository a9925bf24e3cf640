use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use appboot_python::{detect_interpreter, detect_interpreter_in};

use super::command::CommandSpec;
use super::process::{hand_off, run_command, run_command_streaming, RunOutput};

pub trait PythonRuntime: Send + Sync {
    fn detect_interpreter(
        &self,
        explicit: Option<&str>,
        search_path: Option<&str>,
        cwd: &Path,
    ) -> Result<PathBuf>;
}

pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &CommandSpec) -> Result<RunOutput>;
    fn run_streaming(&self, command: &CommandSpec) -> Result<RunOutput>;
    fn hand_off(&self, command: &CommandSpec) -> Result<i32>;
}

pub trait FileSystem: Send + Sync {
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
}

/// Everything the boot sequence does to the outside world.
pub trait Effects: Send + Sync {
    fn python(&self) -> &dyn PythonRuntime;
    fn process(&self) -> &dyn ProcessRunner;
    fn fs(&self) -> &dyn FileSystem;
}

pub struct SystemEffects {
    python: Arc<SystemPythonRuntime>,
    process: Arc<SystemProcessRunner>,
    fs: Arc<SystemFileSystem>,
}

impl SystemEffects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            python: Arc::new(SystemPythonRuntime),
            process: Arc::new(SystemProcessRunner),
            fs: Arc::new(SystemFileSystem),
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects for SystemEffects {
    fn python(&self) -> &dyn PythonRuntime {
        self.python.as_ref()
    }

    fn process(&self) -> &dyn ProcessRunner {
        self.process.as_ref()
    }

    fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }
}

struct SystemPythonRuntime;

impl PythonRuntime for SystemPythonRuntime {
    fn detect_interpreter(
        &self,
        explicit: Option<&str>,
        search_path: Option<&str>,
        cwd: &Path,
    ) -> Result<PathBuf> {
        match search_path {
            Some(path) => detect_interpreter_in(explicit, path, cwd),
            None => detect_interpreter(explicit),
        }
    }
}

struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<RunOutput> {
        run_command(command)
    }

    fn run_streaming(&self, command: &CommandSpec) -> Result<RunOutput> {
        run_command_streaming(command)
    }

    fn hand_off(&self, command: &CommandSpec) -> Result<i32> {
        hand_off(command)
    }
}

struct SystemFileSystem;

impl FileSystem for SystemFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}
