use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Interpreter names tried in order when no explicit path is configured.
pub const INTERPRETER_CANDIDATES: [&str; 2] = ["python3", "python"];

/// Finds the interpreter used to create the runtime environment.
///
/// An explicit path wins outright; otherwise the first candidate found on
/// `PATH` is returned.
pub fn detect_interpreter(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(explicit) = explicit {
        return Ok(PathBuf::from(explicit));
    }

    for candidate in INTERPRETER_CANDIDATES {
        if let Ok(path) = which::which(candidate) {
            return Ok(path);
        }
    }

    bail!("no python interpreter found on PATH; set APPBOOT_PYTHON")
}

/// Same as [`detect_interpreter`] but searches an explicit `PATH` value.
pub fn detect_interpreter_in(
    explicit: Option<&str>,
    search_path: impl AsRef<OsStr>,
    cwd: &Path,
) -> Result<PathBuf> {
    if let Some(explicit) = explicit {
        return Ok(PathBuf::from(explicit));
    }

    for candidate in INTERPRETER_CANDIDATES {
        if let Ok(path) = which::which_in(candidate, Some(search_path.as_ref()), cwd) {
            return Ok(path);
        }
    }

    bail!("no python interpreter found on PATH; set APPBOOT_PYTHON")
}

/// Paths inside a virtual environment rooted at `root`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VenvLayout {
    root: PathBuf,
}

impl VenvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn python(&self) -> PathBuf {
        self.executable("python")
    }

    pub fn executable(&self, name: &str) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join(format!("{name}.exe"))
        } else {
            self.bin_dir().join(name)
        }
    }
}
