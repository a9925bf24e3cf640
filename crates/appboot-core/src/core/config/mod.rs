pub(crate) mod settings;

pub use settings::{
    resolve_log_file, BootConfig, BootOverrides, EnvSnapshot, DEFAULT_LOG_FILE,
    DEFAULT_VENV_DIR, OBSERVED_VARS,
};
