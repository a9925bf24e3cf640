use std::fmt;
use std::num::NonZeroU32;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_WORKERS: u32 = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Where the resolved port came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSource {
    Port,
    WebsitesPort,
    Default,
}

impl PortSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Port => "PORT",
            Self::WebsitesPort => "WEBSITES_PORT",
            Self::Default => "default",
        }
    }
}

/// Host and port the server binds to. Fields are private so a resolved
/// binding cannot be altered after the fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkBinding {
    host: String,
    port: u16,
    source: PortSource,
}

impl NetworkBinding {
    /// Resolves the binding from raw variable values in priority order:
    /// `PORT`, then `WEBSITES_PORT`, then [`DEFAULT_PORT`]. Empty values
    /// count as unset; a set but malformed value is an error rather than
    /// a silent fall-through.
    pub fn resolve(
        host: Option<&str>,
        port: Option<&str>,
        websites_port: Option<&str>,
    ) -> Result<Self> {
        let host = non_empty(host).unwrap_or(DEFAULT_HOST).to_string();
        let (port, source) = if let Some(raw) = non_empty(port) {
            (parse_port("PORT", raw)?, PortSource::Port)
        } else if let Some(raw) = non_empty(websites_port) {
            (parse_port("WEBSITES_PORT", raw)?, PortSource::WebsitesPort)
        } else {
            (DEFAULT_PORT, PortSource::Default)
        };
        Ok(Self { host, port, source })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub const fn source(&self) -> PortSource {
        self.source
    }

    pub fn address(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NetworkBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn parse_port(name: &str, raw: &str) -> Result<u16> {
    let port: u16 = raw
        .parse()
        .map_err(|_| anyhow!("{name} must be a port number between 1 and 65535, got `{raw}`"))?;
    if port == 0 {
        bail!("{name} must be a port number between 1 and 65535, got `{raw}`");
    }
    Ok(port)
}

/// Parses `WORKERS`, defaulting to a single worker.
pub fn parse_workers(raw: Option<&str>) -> Result<NonZeroU32> {
    let Some(raw) = non_empty(raw) else {
        return NonZeroU32::new(DEFAULT_WORKERS).ok_or_else(|| anyhow!("default worker count"));
    };
    raw.parse::<NonZeroU32>()
        .map_err(|_| anyhow!("WORKERS must be a positive integer, got `{raw}`"))
}

/// Parses `TIMEOUT` in seconds.
pub fn parse_timeout(raw: Option<&str>) -> Result<u64> {
    match non_empty(raw) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow!("TIMEOUT must be a number of seconds, got `{raw}`")),
        None => Ok(DEFAULT_TIMEOUT_SECS),
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
