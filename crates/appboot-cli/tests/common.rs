#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Variables the binary reads; cleared so the host environment cannot leak in.
const BOOT_VARS: [&str; 11] = [
    "PORT",
    "WEBSITES_PORT",
    "WORKERS",
    "TIMEOUT",
    "HOST",
    "APPBOOT_PYTHON",
    "APPBOOT_VENV",
    "APPBOOT_LOG_FILE",
    "APPBOOT_APP",
    "APPBOOT_LOCK_FALLBACK",
    "NO_COLOR",
];

pub struct Site {
    pub temp: TempDir,
}

impl Site {
    pub fn new(prefix: &str) -> Self {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("tempdir");
        fs::create_dir_all(temp.path().join("site")).expect("site dir");
        Self { temp }
    }

    pub fn project(&self) -> PathBuf {
        self.temp.path().join("site")
    }

    pub fn log_file(&self) -> PathBuf {
        self.temp.path().join("LogFiles").join("startup.log")
    }

    pub fn touch(&self, name: &str) {
        fs::write(self.project().join(name), "").expect("write manifest");
    }

    /// `appboot` pointed at this site with a clean environment and the log
    /// redirected into the temp dir.
    pub fn appboot(&self) -> Command {
        self.appboot_logging_to(&self.log_file())
    }

    pub fn appboot_logging_to(&self, log_file: &Path) -> Command {
        let mut cmd = self.appboot_unlogged();
        cmd.arg("--log-file").arg(log_file);
        cmd
    }

    /// `appboot` pointed at this site, leaving the log location to the
    /// environment.
    pub fn appboot_unlogged(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("appboot");
        for var in BOOT_VARS {
            cmd.env_remove(var);
        }
        cmd.arg("--project").arg(self.project());
        cmd
    }

    pub fn read_log(&self) -> String {
        fs::read_to_string(self.log_file()).expect("read boot log")
    }

    /// A directory with no interpreters, usable as `PATH`.
    pub fn empty_path(&self) -> PathBuf {
        let dir = self.temp.path().join("empty-bin");
        fs::create_dir_all(&dir).expect("empty bin dir");
        dir
    }
}

pub fn parse_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("json payload")
}
