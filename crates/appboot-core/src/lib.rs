#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

mod core;

#[cfg(test)]
pub(crate) use crate::core::boot;
pub(crate) use crate::core::runtime::effects;
pub(crate) use crate::core::{config, errors, runtime, tooling};

pub use crate::core::boot::discovery::{discover, observe, Discovery};
pub use crate::core::boot::health::{run_health_check, HealthReport};
pub use crate::core::boot::plan::{plan, BootPlan, PlannedEnvironment, PlannedStep};
pub use crate::core::boot::prepare::EnvironmentAction;
pub use crate::core::boot::sequencer::{bootstrap, LaunchOutcome};
pub use crate::core::boot::Phase;
pub use crate::core::config::{
    resolve_log_file, BootConfig, BootOverrides, EnvSnapshot, DEFAULT_LOG_FILE,
};
pub use crate::core::errors::{exit_code_for, BootError};
pub use crate::core::runtime::effects::{Effects, SystemEffects};
pub use crate::core::runtime::traceback::{TracebackFrame, TracebackHint, TracebackReport};
pub use crate::core::tooling::outcome::{to_json_response, CommandStatus, ExecutionOutcome};
pub use crate::core::tooling::BootLog;

pub const APPBOOT_VERSION: &str = env!("CARGO_PKG_VERSION");
