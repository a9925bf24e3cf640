use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

/// Append-only, line-oriented operator log.
///
/// Lines are timestamped and mirrored to stderr unless the log is quiet.
/// A log that cannot be opened or written degrades to the mirror alone.
pub struct BootLog {
    path: PathBuf,
    file: Option<File>,
    echo: bool,
}

impl BootLog {
    /// Opens `path` for appending, creating parent directories.
    pub fn open(path: &Path, echo: bool) -> Self {
        let file = match open_append(path) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(%err, path = %path.display(), "boot log unavailable; continuing without it");
                None
            }
        };
        Self {
            path: path.to_path_buf(),
            file,
            echo,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.file.is_some()
    }

    /// Writes one timestamped line.
    pub fn line(&mut self, message: impl AsRef<str>) {
        let line = format!("[{}] {}", timestamp(), message.as_ref());
        if self.echo {
            eprintln!("{line}");
        }
        self.write(&format!("{line}\n"));
    }

    /// Appends captured subprocess output verbatim. The text already went to
    /// the console while it streamed, so it is not echoed again.
    pub fn raw(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if text.ends_with('\n') {
            self.write(text);
        } else {
            self.write(&format!("{text}\n"));
        }
    }

    /// Appends captured output that has not been shown yet.
    pub fn raw_echoed(&mut self, text: &str) {
        if self.echo && !text.is_empty() {
            eprint!("{text}");
            if !text.ends_with('\n') {
                eprintln!();
            }
        }
        self.raw(text);
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(err) = file.flush() {
                warn!(%err, path = %self.path.display(), "boot log flush failed");
            }
        }
    }

    fn write(&mut self, text: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(err) = file.write_all(text.as_bytes()) {
            warn!(%err, path = %self.path.display(), "boot log write failed; disabling it");
            self.file = None;
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn timestamp() -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| "unknown-time".to_string())
}
