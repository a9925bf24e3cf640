use appboot_core::TracebackReport;

use crate::style::Style;

const DEFAULT_HEADER: &str = "Traceback (most recent call last):";

pub struct TracebackDisplay {
    pub body: String,
    pub hint_line: Option<String>,
}

pub fn format_traceback(style: &Style, report: &TracebackReport) -> TracebackDisplay {
    let mut lines = Vec::new();
    if !report.frames.is_empty() {
        lines.push(style.traceback_header(DEFAULT_HEADER));
    }
    for frame in &report.frames {
        lines.push(style.traceback_location(&frame.file, frame.line, &frame.function));
        if let Some(code) = frame.code.as_deref() {
            lines.push(style.traceback_code(code));
        }
    }
    lines.push(style.traceback_error(&report.summary()));
    let hint_line = report
        .hint
        .as_ref()
        .map(|hint| hint.hint.trim())
        .filter(|hint| !hint.is_empty())
        .map(|hint| style.hint(hint));
    TracebackDisplay {
        body: lines.join("\n"),
        hint_line,
    }
}
