use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A fully described subprocess invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Short program name for messages, e.g. `uv` for `/srv/.venv/bin/uv`.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or_else(|| OsStr::new(""))
            .to_string_lossy()
            .into_owned()
    }

    /// Shell-like rendering for logs; multi-line arguments are elided.
    #[must_use]
    pub fn display_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.envs.len() + self.args.len() + 1);
        for (key, value) in &self.envs {
            parts.push(format!("{key}={}", quote(value)));
        }
        parts.push(quote(&self.program.to_string_lossy()));
        for arg in &self.args {
            if arg.contains('\n') {
                parts.push("<script>".to_string());
            } else {
                parts.push(quote(arg));
            }
        }
        parts.join(" ")
    }
}

fn quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "-_./:=@+,".contains(ch))
    {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
