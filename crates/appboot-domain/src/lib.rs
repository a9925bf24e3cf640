#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod binding;
pub mod manifest;
pub mod target;

pub use binding::{
    parse_timeout, parse_workers, NetworkBinding, PortSource, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS,
};
pub use manifest::{
    ManifestSet, ResolutionStrategy, LOCK_FILE, PROJECT_FILE, REQUIREMENTS_FILE,
};
pub use target::{AppTarget, DEFAULT_APP_TARGET};
