//! TOML-backed loader for [`ScrivenerConfig`] (spec §4.7)
//!
//! Reads a `{sinks: [...]}` TOML document from a path. Anything else
//! (extra top-level keys, a sink entry with unrecognised fields) is
//! rejected by `serde`'s `deny_unknown_fields` rather than silently ignored.

use crate::config::ScrivenerConfig;
use crate::error::Result;
use std::path::Path;

pub fn load(path: &Path) -> Result<ScrivenerConfig> {
    let text = std::fs::read_to_string(path)?;
    let config: ScrivenerConfig = toml::from_str(&text)?;
    Ok(config)
}
