//! The logger: sink registry, record construction, dispatch (spec §4.1)

use crate::catcher::Catcher;
use crate::config::ScrivenerConfig;
use crate::error::Result;
use crate::exception::CapturedException;
use crate::filter::Filter;
use crate::handler::Handler;
use crate::level::Level;
use crate::record::{CallSite, Record};
use crate::sink::SinkTarget;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

/// The logger. Cheap to construct; tests build independent instances rather
/// than sharing the process-global one (spec §9's "expose a constructor, not
/// only a singleton").
pub struct Logger {
    start_time: DateTime<Utc>,
    handlers: RwLock<Vec<Handler>>,
    next_handler_id: RwLock<usize>,
    bound_fields: RwLock<HashMap<String, serde_json::Value>>,
    global_console_display: RwLock<bool>,
    global_file_storage: RwLock<bool>,
    debug_mode: RwLock<bool>,
    debug_log_file: RwLock<Option<String>>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            handlers: RwLock::new(Vec::new()),
            next_handler_id: RwLock::new(1),
            bound_fields: RwLock::new(HashMap::new()),
            global_console_display: RwLock::new(true),
            global_file_storage: RwLock::new(true),
            debug_mode: RwLock::new(false),
            debug_log_file: RwLock::new(None),
        }
    }

    /// Enables or disables every non-file (stream/callable) handler at once,
    /// independent of each handler's own level and filter (spec §4.7).
    pub fn set_global_console_display(&self, enabled: bool) {
        *self.global_console_display.write() = enabled;
    }

    /// Enables or disables every file handler at once (spec §4.7).
    pub fn set_global_file_storage(&self, enabled: bool) {
        *self.global_file_storage.write() = enabled;
    }

    /// Turns on internal one-line diagnostics for handler registration and
    /// removal (spec §4.7).
    pub fn set_debug_mode(&self, enabled: bool) {
        *self.debug_mode.write() = enabled;
    }

    /// Redirects the diagnostics enabled by [`Logger::set_debug_mode`] to a
    /// file instead of stderr; `None` restores stderr.
    pub fn set_debug_log_file(&self, path: Option<String>) {
        *self.debug_log_file.write() = path;
    }

    fn debug_log(&self, message: &str) {
        if !*self.debug_mode.read() {
            return;
        }
        let line = format!("[SCRIVENER DEBUG] {message}");
        match &*self.debug_log_file.read() {
            Some(path) => {
                use std::io::Write;
                if let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
                    let _ = writeln!(file, "{line}");
                }
            }
            None => eprintln!("{line}"),
        }
    }

    /// Registers a handler for `target`, returning its id. `format` defaults
    /// to [`crate::format::DEFAULT_FORMAT`]; `colored` defaults to the
    /// target's own inference (spec §4.2, §9).
    #[allow(clippy::too_many_arguments)]
    pub fn log_to(
        &self,
        target: SinkTarget,
        min_level: Level,
        format: Option<&str>,
        filter: Filter,
        colored: Option<bool>,
        pretty_exceptions: bool,
    ) -> usize {
        let colored = colored.unwrap_or_else(|| target.default_colored());
        let template = format.unwrap_or(crate::format::DEFAULT_FORMAT);

        let mut next_id = self.next_handler_id.write();
        let id = *next_id;
        *next_id += 1;
        drop(next_id);

        let handler = Handler::new(id, target, min_level, filter, template, colored, pretty_exceptions);
        self.handlers.write().push(handler);
        self.debug_log(&format!("handler {id} added"));
        id
    }

    /// Removes one handler (by id) or all of them, stopping each as it's
    /// removed. Returns the number of handlers removed.
    pub fn clear(&self, handler_id: Option<usize>) -> usize {
        let mut handlers = self.handlers.write();
        match handler_id {
            Some(id) => {
                if let Some(pos) = handlers.iter().position(|h| h.id() == id) {
                    let handler = handlers.remove(pos);
                    let _ = handler.stop();
                    1
                } else {
                    0
                }
            }
            None => {
                let count = handlers.len();
                for handler in handlers.drain(..) {
                    let _ = handler.stop();
                }
                count
            }
        }
    }

    /// Replaces the entire handler set from a config mapping and applies its
    /// logger-wide toggles (spec §4.7).
    pub fn config(&self, config: ScrivenerConfig) -> Result<Vec<usize>> {
        if let Some(enabled) = config.global_console_display {
            self.set_global_console_display(enabled);
        }
        if let Some(enabled) = config.global_file_storage {
            self.set_global_file_storage(enabled);
        }
        self.set_debug_mode(config.debug_mode);
        self.set_debug_log_file(config.debug_log_file.clone());

        self.clear(None);
        let mut ids = Vec::new();
        for entry in config.sinks {
            let id = entry.register(self, self.start_time)?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Loads a TOML file shaped like spec §4.7 and applies it via [`Logger::config`].
    pub fn config_from_path(&self, path: impl AsRef<Path>) -> Result<Vec<usize>> {
        let config = crate::config_file::load(path.as_ref())?;
        self.config(config)
    }

    pub fn bind(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.bound_fields.write().insert(key.into(), value.into());
    }

    pub fn unbind(&self, key: &str) -> Option<serde_json::Value> {
        self.bound_fields.write().remove(key)
    }

    pub fn clear_bindings(&self) {
        self.bound_fields.write().clear();
    }

    /// Builds a fresh scoped/decorator error guard (spec §4.5).
    pub fn catch(&self) -> Catcher<'_> {
        Catcher::new(self)
    }

    /// Primitive emission entry point. The per-level convenience methods and
    /// the logging macros (which supply `call_site`) are thin wrappers
    /// around this.
    pub fn emit(&self, level: Level, message: String, call_site: CallSite) -> Result<()> {
        self.dispatch(level, message, call_site, None)
    }

    pub fn trace(&self, message: impl Into<String>, call_site: CallSite) -> Result<()> {
        self.emit(Level::Trace, message.into(), call_site)
    }

    pub fn debug(&self, message: impl Into<String>, call_site: CallSite) -> Result<()> {
        self.emit(Level::Debug, message.into(), call_site)
    }

    pub fn info(&self, message: impl Into<String>, call_site: CallSite) -> Result<()> {
        self.emit(Level::Info, message.into(), call_site)
    }

    pub fn success(&self, message: impl Into<String>, call_site: CallSite) -> Result<()> {
        self.emit(Level::Success, message.into(), call_site)
    }

    pub fn warning(&self, message: impl Into<String>, call_site: CallSite) -> Result<()> {
        self.emit(Level::Warning, message.into(), call_site)
    }

    pub fn error(&self, message: impl Into<String>, call_site: CallSite) -> Result<()> {
        self.emit(Level::Error, message.into(), call_site)
    }

    pub fn critical(&self, message: impl Into<String>, call_site: CallSite) -> Result<()> {
        self.emit(Level::Critical, message.into(), call_site)
    }

    /// Logs `error` at ERROR with a freshly captured traceback (spec §4.4).
    #[track_caller]
    pub fn exception(
        &self,
        message: impl Into<String>,
        error: &impl std::fmt::Display,
        call_site: CallSite,
    ) -> Result<()> {
        let captured = CapturedException::capture("Error", error.to_string(), 0);
        self.dispatch(Level::Error, message.into(), call_site, Some(captured))
    }

    /// Used internally by [`Catcher`], which has already captured its own
    /// traceback at the right depth.
    pub(crate) fn log_with_exception(
        &self,
        level: Level,
        message: String,
        call_site: CallSite,
        captured: CapturedException,
    ) {
        let _ = self.dispatch(level, message, call_site, Some(captured));
    }

    /// Builds the record and hands it to every handler in registration
    /// order. An error from one handler propagates immediately; later
    /// handlers in that emission are not invoked (spec §7). Handlers are
    /// gated first by the logger-wide console/file toggles (spec §4.7
    /// supplement).
    fn dispatch(
        &self,
        level: Level,
        message: String,
        call_site: CallSite,
        exception: Option<CapturedException>,
    ) -> Result<()> {
        let console_enabled = *self.global_console_display.read();
        let file_enabled = *self.global_file_storage.read();
        if !console_enabled && !file_enabled {
            return Ok(());
        }

        self.debug_log(&format!("logging: {} - {message}", level.as_str()));

        let fields = self.bound_fields.read().clone();
        let record = Record::new(level, message, call_site, self.start_time, exception, fields);
        for handler in self.handlers.read().iter() {
            let allowed = if handler.is_file_target() { file_enabled } else { console_enabled };
            if !allowed {
                continue;
            }
            handler.emit(&record)?;
        }
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
