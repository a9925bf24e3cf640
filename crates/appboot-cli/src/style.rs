use std::env;

use appboot_core::CommandStatus;
use color_eyre::owo_colors::OwoColorize;

pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(force_no_color: bool, is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !(force_no_color || env_no_color) && is_tty,
        }
    }

    pub fn status(&self, status: CommandStatus, text: &str) -> String {
        let (symbol, tone) = match status {
            CommandStatus::Ok => ("✔", Tone::Green),
            CommandStatus::UserError => ("✗", Tone::Yellow),
            CommandStatus::Failure => ("✖", Tone::Red),
        };
        self.paint(&format!("{symbol} {text}"), tone, true)
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, Tone::Blue, false)
    }

    pub fn label(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        text.bold().to_string()
    }

    pub fn command(&self, text: &str) -> String {
        if !self.enabled {
            return format!("    {text}");
        }
        format!("    {}", text.dimmed())
    }

    pub fn traceback_header(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        text.cyan().bold().to_string()
    }

    pub fn traceback_location(&self, file: &str, line: u32, function: &str) -> String {
        if !self.enabled {
            return format!("  File \"{file}\", line {line}, in {function}");
        }
        let file_part = format!("\"{file}\"").cyan().underline().to_string();
        let func_part = function.bold().to_string();
        format!("  File {file_part}, line {line}, in {func_part}")
    }

    pub fn traceback_code(&self, code: &str) -> String {
        if !self.enabled {
            return format!("    {code}");
        }
        format!("    {}", code.dimmed())
    }

    pub fn traceback_error(&self, line: &str) -> String {
        self.paint(line, Tone::Red, true)
    }

    pub fn hint(&self, hint: &str) -> String {
        if !self.enabled {
            return format!("appboot ▸ Hint: {hint}");
        }
        let prefix = "appboot ▸ Hint:".cyan().bold().to_string();
        format!("{prefix} {hint}")
    }

    fn paint(&self, text: &str, tone: Tone, bold: bool) -> String {
        if !self.enabled {
            return text.to_string();
        }
        match (tone, bold) {
            (Tone::Green, true) => text.green().bold().to_string(),
            (Tone::Green, false) => text.green().to_string(),
            (Tone::Yellow, true) => text.yellow().bold().to_string(),
            (Tone::Yellow, false) => text.yellow().to_string(),
            (Tone::Red, true) => text.red().bold().to_string(),
            (Tone::Red, false) => text.red().to_string(),
            (Tone::Blue, true) => text.cyan().bold().to_string(),
            (Tone::Blue, false) => text.cyan().to_string(),
        }
    }
}

enum Tone {
    Green,
    Yellow,
    Red,
    Blue,
}
