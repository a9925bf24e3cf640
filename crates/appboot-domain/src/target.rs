use std::fmt;

use anyhow::{bail, Result};
use serde::Serialize;

pub const DEFAULT_APP_TARGET: &str = "app.main:app";
const DEFAULT_OBJECT: &str = "app";

/// An ASGI application reference in `module:object` form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppTarget {
    module: String,
    object: String,
}

impl AppTarget {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (module, object) = match raw.split_once(':') {
            Some((module, object)) => (module.trim(), object.trim()),
            None => (raw, DEFAULT_OBJECT),
        };
        if !is_dotted_identifier(module) {
            bail!("application target `{raw}` must name a module, e.g. `{DEFAULT_APP_TARGET}`");
        }
        if !is_identifier(object) {
            bail!("application target `{raw}` has an invalid object name `{object}`");
        }
        Ok(Self {
            module: module.to_string(),
            object: object.to_string(),
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn object(&self) -> &str {
        &self.object
    }
}

impl Default for AppTarget {
    fn default() -> Self {
        Self {
            module: "app.main".to_string(),
            object: DEFAULT_OBJECT.to_string(),
        }
    }
}

impl fmt::Display for AppTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.object)
    }
}

fn is_dotted_identifier(value: &str) -> bool {
    !value.is_empty() && value.split('.').all(is_identifier)
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|ch| ch == '_' || ch.is_alphanumeric())
        }
        _ => false,
    }
}
