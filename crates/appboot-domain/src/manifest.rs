use std::fmt;
use std::path::Path;

use serde::Serialize;

pub const LOCK_FILE: &str = "uv.lock";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const PROJECT_FILE: &str = "pyproject.toml";

/// Which dependency manifests exist at the project root.
///
/// Only presence matters; contents are never read here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ManifestSet {
    pub lock: bool,
    pub requirements: bool,
    pub project: bool,
}

impl ManifestSet {
    pub fn detect(root: &Path) -> Self {
        Self::detect_with(root, Path::is_file)
    }

    /// Probes presence through `is_file`, for callers that route filesystem
    /// access through their own seam.
    pub fn detect_with(root: &Path, mut is_file: impl FnMut(&Path) -> bool) -> Self {
        Self {
            lock: is_file(&root.join(LOCK_FILE)),
            requirements: is_file(&root.join(REQUIREMENTS_FILE)),
            project: is_file(&root.join(PROJECT_FILE)),
        }
    }

    /// Picks the single install strategy for this set: lock, then
    /// requirements, then the project itself.
    pub const fn strategy(self) -> ResolutionStrategy {
        if self.lock {
            ResolutionStrategy::LockedSync
        } else if self.requirements {
            ResolutionStrategy::RequirementsInstall
        } else {
            ResolutionStrategy::EditableProjectInstall
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    LockedSync,
    RequirementsInstall,
    EditableProjectInstall,
}

impl ResolutionStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LockedSync => "locked_sync",
            Self::RequirementsInstall => "requirements_install",
            Self::EditableProjectInstall => "editable_project_install",
        }
    }

    /// The manifest file the strategy installs from.
    pub const fn manifest(self) -> &'static str {
        match self {
            Self::LockedSync => LOCK_FILE,
            Self::RequirementsInstall => REQUIREMENTS_FILE,
            Self::EditableProjectInstall => PROJECT_FILE,
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
