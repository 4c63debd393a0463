//! Log levels with priority-based ordering
//!
//! Defines the registered severities and the numeric priority each one maps
//! to. Each level carries a default style hint used by the format compiler's
//! `<level>`/`<lvl>` pseudo-tag. Levels are process-global and registered at
//! startup; nothing mutates them afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named severity with a numeric priority in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Priority 0: placeholder for "no level set".
    NotSet = 0,
    /// Priority 5: most verbose, for fine-grained diagnostics.
    Trace = 5,
    /// Priority 10: debugging information.
    Debug = 10,
    /// Priority 20: general information.
    Info = 20,
    /// Priority 25: successful operations.
    Success = 25,
    /// Priority 30: warning conditions.
    Warning = 30,
    /// Priority 40: error conditions.
    Error = 40,
    /// Priority 50: critical failures.
    Critical = 50,
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::NotSet => "NOTSET",
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    pub fn priority(&self) -> u8 {
        *self as u8
    }

    /// Bare ANSI SGR code used when no markup tag resolves the level's color.
    pub fn default_color(&self) -> &'static str {
        match self {
            Level::NotSet => "0",
            Level::Trace => "36",    // cyan
            Level::Debug => "34",    // blue
            Level::Info => "1",      // bold
            Level::Success => "32",  // green
            Level::Warning => "33",  // yellow
            Level::Error => "31",    // red
            Level::Critical => "91", // bright red
        }
    }

    /// Default markup used to resolve the `<level>`/`<lvl>` pseudo-tag for this level.
    pub fn default_markup(&self) -> &'static str {
        match self {
            Level::NotSet => "",
            Level::Trace => "<cyan><bold>",
            Level::Debug => "<blue><bold>",
            Level::Info => "<bold>",
            Level::Success => "<green><bold>",
            Level::Warning => "<yellow><bold>",
            Level::Error => "<red><bold>",
            Level::Critical => "<RED><bold>",
        }
    }

    pub fn all_levels() -> [Level; 7] {
        [
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Success,
            Level::Warning,
            Level::Error,
            Level::Critical,
        ]
    }

    pub fn from_priority(priority: u8) -> Option<Self> {
        match priority {
            0 => Some(Level::NotSet),
            5 => Some(Level::Trace),
            10 => Some(Level::Debug),
            20 => Some(Level::Info),
            25 => Some(Level::Success),
            30 => Some(Level::Warning),
            40 => Some(Level::Error),
            50 => Some(Level::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Level {
    type Err = crate::error::ScrivenerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NOTSET" => Ok(Level::NotSet),
            "TRACE" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "SUCCESS" => Ok(Level::Success),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" | "CRIT" => Ok(Level::Critical),
            _ => Err(crate::error::ScrivenerError::InvalidLevel(s.to_string())),
        }
    }
}
