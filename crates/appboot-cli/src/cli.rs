use std::path::PathBuf;

use appboot_core::BootOverrides;
use clap::{ArgAction, Parser, Subcommand};

pub const APPBOOT_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nOptions:\n{options}\n";

pub const APPBOOT_BEFORE_HELP: &str = concat!(
    "appboot ",
    env!("CARGO_PKG_VERSION"),
    " – Health-gated bootstrap for Python ASGI deployments\n\n",
    "\x1b[1;36mCommands\x1b[0m\n",
    "  start            Prepare the environment, install dependencies, import the app, then exec the server.\n",
    "  plan             Show every command `start` would run, without running anything.\n",
    "  check            Import the app inside an existing environment and report the result.\n\n",
    "\x1b[1;36mEnvironment\x1b[0m\n",
    "  PORT, WEBSITES_PORT, HOST, WORKERS, TIMEOUT shape the server command.\n",
    "  Boot progress is appended to APPBOOT_LOG_FILE (default /home/LogFiles/startup.log).\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "appboot",
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = APPBOOT_BEFORE_HELP,
    help_template = APPBOOT_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppbootCli {
    #[arg(
        short,
        long,
        help = "Suppress human output and the console mirror of the boot log",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        value_name = "DIR",
        help = "Project root holding the manifests (default: current directory)",
        global = true
    )]
    pub project: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        env = "APPBOOT_VENV",
        help = "Runtime environment directory, relative to the project root",
        global = true
    )]
    pub venv: Option<String>,
    #[arg(
        long,
        value_name = "PATH",
        env = "APPBOOT_LOG_FILE",
        help = "Append the boot log here",
        global = true
    )]
    pub log_file: Option<String>,
    #[arg(
        long,
        value_name = "PATH",
        env = "APPBOOT_PYTHON",
        help = "Interpreter used to create the environment (skips the PATH search)",
        global = true
    )]
    pub python: Option<String>,
    #[arg(
        long,
        value_name = "MODULE:OBJECT",
        env = "APPBOOT_APP",
        help = "ASGI application to import and serve",
        global = true
    )]
    pub app: Option<String>,
    #[arg(
        long,
        help = "Abort instead of retrying a rejected frozen sync without --frozen",
        global = true
    )]
    pub no_lock_fallback: bool,
    #[command(subcommand)]
    pub command: CommandCli,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCli {
    #[command(
        about = "Run the full boot sequence and hand the process to the server.",
        override_usage = "appboot start [--project DIR] [--log-file PATH]"
    )]
    Start,
    #[command(
        about = "Print the resolved boot plan without side effects.",
        override_usage = "appboot plan [--json]"
    )]
    Plan,
    #[command(
        about = "Import the application inside the existing environment.",
        override_usage = "appboot check [--app MODULE:OBJECT]"
    )]
    Check,
}

impl CommandCli {
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Plan => "plan",
            Self::Check => "check",
        }
    }
}

impl AppbootCli {
    pub fn overrides(&self) -> BootOverrides {
        BootOverrides {
            project: self.project.clone(),
            venv: non_blank(self.venv.as_deref()).map(PathBuf::from),
            log_file: non_blank(self.log_file.as_deref()).map(PathBuf::from),
            python: non_blank(self.python.as_deref()),
            app: non_blank(self.app.as_deref()),
            no_lock_fallback: self.no_lock_fallback,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}
