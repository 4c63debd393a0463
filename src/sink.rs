//! Polymorphic sink target (spec §4.1, §9)
//!
//! `log_to` accepts a path, a stream, or a callable; each is wrapped into a
//! [`SinkTarget`] by a dedicated typed constructor rather than dispatched at
//! runtime by inspecting an argument's shape. Colored-output defaults follow
//! from the target: off for callables, the stream's own TTY status for
//! streams, on for files.

use crate::error::Result;
use crate::file_sink::FileSink;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::io::{IsTerminal, Write};
use std::sync::Arc;

/// Where a handler's rendered text ultimately goes.
pub enum SinkTarget {
    File(Arc<FileSink>),
    Stream {
        writer: Arc<Mutex<dyn Write + Send>>,
        is_tty: bool,
    },
    Callable(Arc<dyn Fn(&str) + Send + Sync>),
}

impl SinkTarget {
    pub fn file(sink: FileSink) -> Self {
        SinkTarget::File(Arc::new(sink))
    }

    pub fn stdout() -> Self {
        let is_tty = std::io::stdout().is_terminal();
        SinkTarget::Stream {
            writer: Arc::new(Mutex::new(std::io::stdout())),
            is_tty,
        }
    }

    pub fn stderr() -> Self {
        let is_tty = std::io::stderr().is_terminal();
        SinkTarget::Stream {
            writer: Arc::new(Mutex::new(std::io::stderr())),
            is_tty,
        }
    }

    /// Wraps an arbitrary writer. `is_tty` is supplied by the caller since a
    /// generic `dyn Write` cannot report its own terminal status.
    pub fn stream<W: Write + Send + 'static>(writer: W, is_tty: bool) -> Self {
        SinkTarget::Stream {
            writer: Arc::new(Mutex::new(writer)),
            is_tty,
        }
    }

    pub fn callable<F: Fn(&str) + Send + Sync + 'static>(f: F) -> Self {
        SinkTarget::Callable(Arc::new(f))
    }

    /// The default `colored` setting for this target when the caller doesn't
    /// override it explicitly.
    pub fn default_colored(&self) -> bool {
        match self {
            SinkTarget::Callable(_) => false,
            SinkTarget::Stream { is_tty, .. } => *is_tty,
            SinkTarget::File(_) => true,
        }
    }

    pub fn write(&self, text: &str, record_time: DateTime<Utc>) -> Result<()> {
        match self {
            SinkTarget::File(sink) => sink.write(record_time, text),
            SinkTarget::Stream { writer, .. } => {
                let mut w = writer.lock();
                w.write_all(text.as_bytes())?;
                w.flush()?;
                Ok(())
            }
            SinkTarget::Callable(f) => {
                f(text);
                Ok(())
            }
        }
    }

    pub fn stop(&self) -> Result<()> {
        if let SinkTarget::File(sink) = self {
            sink.stop()
        } else {
            Ok(())
        }
    }
}
