//! Structured application logging with level-aware formatting, namespace
//! filters, and a rotating/compressing file sink.
//!
//! ```no_run
//! use scrivener::prelude::*;
//!
//! let logger = Logger::new();
//! logger.log_to(SinkTarget::stdout(), Level::Info, None, Filter::None, None, false);
//! info!(logger, "server listening on {}", 8080).unwrap();
//! ```

pub mod catcher;
pub mod compression;
pub mod config;
pub mod config_file;
pub mod error;
pub mod exception;
pub mod file_sink;
pub mod filter;
pub mod format;
pub mod handler;
pub mod level;
pub mod logger;
#[macro_use]
pub mod macros;
pub mod record;
pub mod retention;
pub mod rotation;
pub mod sink;

use std::sync::OnceLock;

static GLOBAL_LOGGER: OnceLock<logger::Logger> = OnceLock::new();

/// The process-wide logger. Most applications log through this; tests and
/// library code that need isolation construct their own [`logger::Logger`]
/// instead (spec §9).
pub fn global() -> &'static logger::Logger {
    GLOBAL_LOGGER.get_or_init(logger::Logger::new)
}

/// Re-exports the public surface most callers need in one `use`.
pub mod prelude {
    pub use crate::catcher::Catcher;
    pub use crate::compression::{CompressionFormat, CompressionPolicy};
    pub use crate::config::{ScrivenerConfig, SinkEntry};
    pub use crate::error::{Result, ScrivenerError};
    pub use crate::filter::Filter;
    pub use crate::level::Level;
    pub use crate::logger::Logger;
    pub use crate::record::{CallSite, Record};
    pub use crate::retention::RetentionPolicy;
    pub use crate::rotation::RotationTrigger;
    pub use crate::sink::SinkTarget;
    pub use crate::{critical, debug, error, exception, info, success, trace, warning};
    pub use crate::global;
}
