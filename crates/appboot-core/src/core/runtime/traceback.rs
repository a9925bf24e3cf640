use appboot_domain::ResolutionStrategy;
use serde::Serialize;

const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracebackFrame {
    pub file: String,
    pub line: u32,
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TracebackHint {
    pub reason: &'static str,
    pub hint: String,
}

/// The last traceback found in a stderr capture, reduced to its frames and
/// the final `ErrorType: message` line.
#[derive(Debug, Clone, Serialize)]
pub struct TracebackReport {
    pub frames: Vec<TracebackFrame>,
    pub error_type: String,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<TracebackHint>,
}

impl TracebackReport {
    /// One-line `ErrorType: message` summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.error_message.is_empty() {
            self.error_type.clone()
        } else {
            format!("{}: {}", self.error_type, self.error_message)
        }
    }
}

/// Parses a Python traceback out of `stderr`.
///
/// Output without a traceback header but ending in an `Error:` line (the
/// probe reports a missing application object that way) yields a report
/// with no frames.
#[must_use]
pub fn analyze_python_traceback(
    stderr: &str,
    strategy: Option<ResolutionStrategy>,
) -> Option<TracebackReport> {
    let (frames, error_type, error_message) =
        parse_last_block(stderr).or_else(|| parse_bare_error(stderr))?;
    let hint = missing_import_hint(&error_type, &error_message, strategy)
        .or_else(|| missing_object_hint(&error_type, &error_message));
    Some(TracebackReport {
        frames,
        error_type,
        error_message,
        hint,
    })
}

fn parse_last_block(stderr: &str) -> Option<(Vec<TracebackFrame>, String, String)> {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines
        .iter()
        .rposition(|line| line.trim_start().starts_with(TRACEBACK_HEADER))?;

    let mut frames: Vec<TracebackFrame> = Vec::new();
    let mut idx = start + 1;
    while idx < lines.len() {
        let line = lines[idx];
        let trimmed = line.trim();
        idx += 1;
        if trimmed.is_empty() || is_pointer_line(trimmed) || is_ellipsis_line(trimmed) {
            continue;
        }
        if let Some(frame) = parse_frame_line(trimmed) {
            frames.push(frame);
            continue;
        }
        let indented = line.starts_with(' ') || line.starts_with('\t');
        if indented {
            if let Some(last) = frames.last_mut() {
                if last.code.is_none() {
                    last.code = Some(trimmed.to_string());
                }
            }
            continue;
        }
        let (error_type, error_message) = parse_error_line(trimmed);
        return Some((frames, error_type, error_message));
    }
    None
}

fn parse_bare_error(stderr: &str) -> Option<(Vec<TracebackFrame>, String, String)> {
    let last = stderr.lines().rev().find(|line| !line.trim().is_empty())?;
    let (error_type, error_message) = parse_error_line(last.trim());
    let looks_like_error = error_type.ends_with("Error") || error_type.ends_with("Exception");
    looks_like_error.then(|| (Vec::new(), error_type, error_message))
}

fn is_pointer_line(line: &str) -> bool {
    line.chars().all(|ch| ch == '^' || ch == '~')
}

fn is_ellipsis_line(line: &str) -> bool {
    line.starts_with("...") && line.ends_with("...")
}

fn parse_frame_line(line: &str) -> Option<TracebackFrame> {
    let after_prefix = line.strip_prefix("File \"")?;
    let quote_end = after_prefix.find('"')?;
    let file = after_prefix[..quote_end].to_string();
    let after_line = after_prefix[quote_end + 1..]
        .trim_start()
        .strip_prefix(", line ")?;
    let (number, rest) = after_line
        .split_once(',')
        .unwrap_or((after_line, ""));
    let function = rest
        .trim()
        .strip_prefix("in ")
        .map_or_else(|| "<module>".to_string(), |name| name.trim().to_string());
    Some(TracebackFrame {
        file,
        line: number.trim().parse().ok()?,
        function,
        code: None,
    })
}

fn parse_error_line(line: &str) -> (String, String) {
    match line.split_once(':') {
        Some((kind, message)) => (kind.trim().to_string(), message.trim().to_string()),
        None => (line.trim().to_string(), String::new()),
    }
}

fn missing_import_hint(
    error_type: &str,
    message: &str,
    strategy: Option<ResolutionStrategy>,
) -> Option<TracebackHint> {
    let is_import_error = error_type.ends_with("ModuleNotFoundError")
        || (error_type.ends_with("ImportError") && message.contains("No module named"));
    if !is_import_error {
        return None;
    }
    let module = extract_missing_module(message)?;
    let package = module_to_distribution(&module);
    let hint = match strategy {
        Some(ResolutionStrategy::LockedSync) => format!(
            "`{module}` is not installed; add it with `uv add {package}` and commit the updated uv.lock"
        ),
        Some(ResolutionStrategy::RequirementsInstall) => {
            format!("`{module}` is not installed; add `{package}` to requirements.txt")
        }
        Some(ResolutionStrategy::EditableProjectInstall) => format!(
            "`{module}` is not installed; declare `{package}` under [project].dependencies in pyproject.toml"
        ),
        None => format!("`{module}` is not installed; add `{package}` to the project's dependencies"),
    };
    Some(TracebackHint {
        reason: "missing_import",
        hint,
    })
}

fn missing_object_hint(error_type: &str, message: &str) -> Option<TracebackHint> {
    if error_type.ends_with("AttributeError") && message.contains("has no attribute") {
        return Some(TracebackHint {
            reason: "missing_app_object",
            hint: "the module imported but the application object is missing; check --app / APPBOOT_APP"
                .to_string(),
        });
    }
    None
}

fn extract_missing_module(message: &str) -> Option<String> {
    let offset = message.find("No module named")?;
    let token = message[offset + "No module named".len()..]
        .trim()
        .trim_start_matches(':')
        .trim()
        .trim_start_matches(['\'', '"']);
    let end = token
        .find(|c: char| [' ', '"', '\'', ':', ')', ','].contains(&c))
        .unwrap_or(token.len());
    let module = token[..end].trim_end_matches('.');
    (!module.is_empty()).then(|| module.to_string())
}

fn module_to_distribution(module: &str) -> String {
    let top = module.split('.').next().unwrap_or(module);
    match top {
        "yaml" => "PyYAML",
        "cv2" => "opencv-python",
        "PIL" => "Pillow",
        "sklearn" => "scikit-learn",
        "bs4" => "beautifulsoup4",
        "dotenv" => "python-dotenv",
        "jwt" => "PyJWT",
        "google" => "google-api-python-client",
        other => other,
    }
    .to_string()
}
