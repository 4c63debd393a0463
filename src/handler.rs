//! Per-sink handler (spec §4.2)
//!
//! Owns everything a registered sink needs to decide, render, and dispatch
//! one record: the level gate, the optional filter, one compiled format
//! (resolved per level at construction), and the sink target itself.

use crate::error::Result;
use crate::filter::Filter;
use crate::format::CompiledFormat;
use crate::level::Level;
use crate::record::Record;
use crate::sink::SinkTarget;

pub struct Handler {
    id: usize,
    target: SinkTarget,
    min_level: Level,
    filter: Filter,
    format: CompiledFormat,
    pretty_exceptions: bool,
}

impl Handler {
    pub fn new(
        id: usize,
        target: SinkTarget,
        min_level: Level,
        filter: Filter,
        format_template: &str,
        colored: bool,
        pretty_exceptions: bool,
    ) -> Self {
        Self {
            id,
            target,
            min_level,
            filter,
            format: CompiledFormat::compile(format_template, colored),
            pretty_exceptions,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Gates on level, applies the filter, renders, appends the exception
    /// (if any), and dispatches to the sink: spec §4.2's emit sequence.
    pub fn emit(&self, record: &Record) -> Result<()> {
        if record.level.no < self.min_level.priority() {
            return Ok(());
        }
        if !self.filter.matches(record) {
            return Ok(());
        }
        let mut text = self.format.render(record)?;
        if let Some(exception) = &record.exception {
            text.push_str(&exception.render(self.pretty_exceptions));
            text.push('\n');
        }
        self.target.write(&text, record.time)
    }

    pub fn stop(&self) -> Result<()> {
        self.target.stop()
    }

    /// Whether this handler writes to a file (as opposed to a stream or a
    /// callable), used by the logger's `global_file_storage`/
    /// `global_console_display` toggles (spec §4.7).
    pub(crate) fn is_file_target(&self) -> bool {
        matches!(self.target, SinkTarget::File(_))
    }
}
