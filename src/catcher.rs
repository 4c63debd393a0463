//! Scoped and decorator-style error capture (spec §4.5)
//!
//! The original implementation's catcher mutated shared state across calls,
//! which is not sound to share across threads. This one is built fresh per
//! invocation (spec §9): `logger.catch()` returns a builder, and each of
//! [`Catcher::run`]/[`Catcher::wrap`] returns `Result<Option<T>, E>`:
//! `Ok(Some(v))` on success, `Ok(None)` when the error was logged and
//! swallowed, `Err(e)` when `reraise` is set and the error is handed back.

use crate::exception::CapturedException;
use crate::level::Level;
use crate::logger::Logger;
use crate::record::CallSite;
use std::panic::Location;

pub struct Catcher<'a> {
    logger: &'a Logger,
    message: String,
    reraise: bool,
}

impl<'a> Catcher<'a> {
    pub(crate) fn new(logger: &'a Logger) -> Self {
        Self {
            logger,
            message: "An error has been caught".to_string(),
            reraise: false,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn reraise(mut self, reraise: bool) -> Self {
        self.reraise = reraise;
        self
    }

    /// Scoped use: runs `body` in place. The caught-point frame is the caller
    /// of `run` itself (depth 0).
    #[track_caller]
    pub fn run<T, E>(
        &self,
        body: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<Option<T>, E>
    where
        E: std::fmt::Display,
    {
        let location = Location::caller();
        match body() {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                self.emit(&error, location, "<scope>", 0);
                if self.reraise { Err(error) } else { Ok(None) }
            }
        }
    }

    /// Decorator use: wraps `f`, naming it `function_name` in the rendered
    /// message. The wrapper sits between the caller and the logger, so the
    /// caught point is marked one frame further out than scoped use.
    #[track_caller]
    pub fn wrap<T, E>(
        &self,
        function_name: &str,
        f: impl Fn() -> std::result::Result<T, E>,
    ) -> std::result::Result<Option<T>, E>
    where
        E: std::fmt::Display,
    {
        let location = Location::caller();
        match f() {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                self.emit(&error, location, function_name, 1);
                if self.reraise { Err(error) } else { Ok(None) }
            }
        }
    }

    fn emit<E: std::fmt::Display>(
        &self,
        error: &E,
        location: &Location<'_>,
        function_name: &str,
        caught_point_depth: usize,
    ) {
        let rendered_message = self
            .message
            .replace("{function}", function_name)
            .replace("{process}", &std::process::id().to_string())
            .replace("{thread}", &thread_name());
        let captured = CapturedException::capture("Error", error.to_string(), caught_point_depth);
        let call_site = CallSite {
            file: location.file(),
            line: location.line(),
            module: "caught",
            function: "<catcher>",
        };
        self.logger
            .log_with_exception(Level::Error, rendered_message, call_site, captured);
    }
}

fn thread_name() -> String {
    std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_string()
}
