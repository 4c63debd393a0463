//! Declarative sink configuration (spec §4.7)
//!
//! `ScrivenerConfig` is the in-memory shape `Logger::config` consumes; TOML
//! files matching the same `{sinks: [...]}` layout are loaded through
//! [`crate::config_file`]. Dynamic script-based configuration (the original
//! implementation's auto-discovered config module) is not carried forward:
//! a config source is always a plain mapping, never executable code.

use crate::compression::{CompressionFormat, CompressionPolicy};
use crate::error::Result;
use crate::filter::Filter;
use crate::file_sink::FileSink;
use crate::level::Level;
use crate::logger::Logger;
use crate::retention::RetentionPolicy;
use crate::sink::SinkTarget;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Top-level configuration: one entry per sink to register, plus the
/// logger-wide console/file/debug display toggles (spec §4.7).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrivenerConfig {
    #[serde(default)]
    pub sinks: Vec<SinkEntry>,
    pub global_console_display: Option<bool>,
    pub global_file_storage: Option<bool>,
    #[serde(default)]
    pub debug_mode: bool,
    pub debug_log_file: Option<String>,
}

/// One sink's declarative configuration. `path` selects a (possibly
/// rotating) file sink; otherwise `stderr` selects standard error, and the
/// default is standard output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkEntry {
    pub path: Option<String>,
    #[serde(default)]
    pub stderr: bool,
    pub level: Option<String>,
    pub format: Option<String>,
    pub filter: Option<String>,
    pub colored: Option<bool>,
    #[serde(default)]
    pub pretty_exceptions: bool,
    pub rotation: Option<String>,
    pub backups: Option<usize>,
    pub retention_days: Option<i64>,
    pub compression: Option<String>,
}

impl SinkEntry {
    /// Resolves this entry into a registered handler on `logger`.
    pub(crate) fn register(&self, logger: &Logger, start_time: DateTime<Utc>) -> Result<usize> {
        let level = match &self.level {
            Some(s) => s.parse::<Level>()?,
            None => Level::Info,
        };
        let filter = match &self.filter {
            Some(namespace) => Filter::namespace(namespace.clone()),
            None => Filter::None,
        };

        let target = if let Some(path) = &self.path {
            let rotation = match &self.rotation {
                Some(spec) => crate::rotation::parse_rotation_string(spec)?,
                None => crate::rotation::RotationTrigger::None,
            };
            let retention = match (self.backups, self.retention_days) {
                (Some(count), _) => RetentionPolicy::Count(count),
                (None, Some(days)) => RetentionPolicy::Age(chrono::TimeDelta::days(days)),
                (None, None) => RetentionPolicy::None,
            };
            let compression = match &self.compression {
                Some(name) => CompressionPolicy::Format(CompressionFormat::parse(name)?),
                None => CompressionPolicy::None,
            };
            SinkTarget::file(FileSink::new(path.clone(), rotation, retention, compression, start_time)?)
        } else if self.stderr {
            SinkTarget::stderr()
        } else {
            SinkTarget::stdout()
        };

        Ok(logger.log_to(
            target,
            level,
            self.format.as_deref(),
            filter,
            self.colored,
            self.pretty_exceptions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_stdout_info_with_no_filter() {
        let logger = Logger::new();
        let config = ScrivenerConfig {
            sinks: vec![SinkEntry::default()],
            ..Default::default()
        };
        let ids = logger.config(config).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(logger.handler_count(), 1);
    }

    #[test]
    fn rejects_unknown_compression_name() {
        let logger = Logger::new();
        let config = ScrivenerConfig {
            sinks: vec![SinkEntry {
                path: Some("/tmp/does-not-matter.log".to_string()),
                compression: Some("rar".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(logger.config(config).is_err());
    }

    #[test]
    fn config_applies_the_global_storage_toggle_before_registering_sinks() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_path = temp_dir.path().join("gated.log");
        let logger = Logger::new();

        let config = ScrivenerConfig {
            sinks: vec![SinkEntry {
                path: Some(log_path.to_string_lossy().into_owned()),
                ..Default::default()
            }],
            global_file_storage: Some(false),
            ..Default::default()
        };
        logger.config(config).unwrap();
        logger
            .info(
                "gated message",
                crate::record::CallSite {
                    file: "src/config.rs",
                    line: 1,
                    module: "app",
                    function: "f",
                },
            )
            .unwrap();

        assert!(!log_path.exists());
    }
}
