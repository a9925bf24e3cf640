use std::fmt;

/// Fatal conditions that carry their own process exit code.
#[derive(thiserror::Error, Debug)]
pub enum BootError {
    #[error("{message}")]
    Config { message: String },
    #[error("{step} failed: `{program}` exited with {}", describe_code(.code))]
    StepFailed {
        step: String,
        program: String,
        code: i32,
    },
    #[error("health check failed: `{module}` could not be imported{}", summary_suffix(.summary))]
    HealthCheck {
        module: String,
        summary: Option<String>,
    },
    #[error("failed to start `{program}`")]
    Spawn { program: String },
    #[error("no python interpreter available to create {venv}")]
    MissingInterpreter { venv: String },
}

impl BootError {
    pub fn config(err: impl fmt::Display) -> Self {
        Self::Config {
            message: format!("{err:#}"),
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::StepFailed { code, .. } if *code > 0 => *code,
            Self::StepFailed { .. } | Self::HealthCheck { .. } => 1,
            Self::Spawn { .. } | Self::MissingInterpreter { .. } => 127,
        }
    }
}

/// Exit code for an arbitrary error: the classified code when a
/// [`BootError`] is anywhere in the chain, otherwise 1.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<BootError>()
        .map_or(1, BootError::exit_code)
}

fn describe_code(code: &i32) -> String {
    if *code < 0 {
        "no status (terminated by a signal)".to_string()
    } else {
        format!("status {code}")
    }
}

fn summary_suffix(summary: &Option<String>) -> String {
    summary.as_deref().map(|s| format!(" ({s})")).unwrap_or_default()
}
