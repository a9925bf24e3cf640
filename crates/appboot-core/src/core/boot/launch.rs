use anyhow::{Context, Result};
use tracing::debug;

use super::commands;
use crate::config::BootConfig;
use crate::effects::Effects;
use crate::tooling::BootLog;

/// Hands the process over to the application server.
///
/// On Unix this only returns when `exec` fails. Elsewhere it returns the
/// server's exit code once the server stops.
///
/// # Errors
///
/// Fails when the server executable cannot be started.
pub fn launch(config: &BootConfig, effects: &dyn Effects, log: &mut BootLog) -> Result<i32> {
    let server = commands::server(config);
    log.line(format!(
        "starting server on {} (workers={})",
        config.binding(),
        config.workers()
    ));
    log.line(format!("exec: {}", server.display_line()));
    log.flush();
    debug!(address = %config.binding(), "handing off to {}", server.program_name());
    effects
        .process()
        .hand_off(&server)
        .with_context(|| format!("failed to launch {}", config.app()))
}
