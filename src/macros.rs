//! Call-site-capturing logging macros (spec §4.1, §9)
//!
//! The original implementation inspects the interpreter's call stack at
//! runtime to report `{file}`/`{function}`/`{line}`/`{module}`. Rust has no
//! such introspection, so these macros capture the equivalent information at
//! compile time via `file!()`/`line!()`/`module_path!()`, plus the
//! well-known "const fn wrapped in `type_name`" idiom for the enclosing
//! function's name, and hand it to the [`crate::logger::Logger`] methods
//! that take an explicit [`crate::record::CallSite`].

/// Expands to the name of the function it's invoked in.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}

/// Expands to a [`crate::record::CallSite`] describing the macro's call site.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::record::CallSite {
            file: file!(),
            line: line!(),
            module: module_path!(),
            function: $crate::function_name!(),
        }
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format!($($arg)*), $crate::call_site!())
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format!($($arg)*), $crate::call_site!())
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format!($($arg)*), $crate::call_site!())
    };
}

#[macro_export]
macro_rules! success {
    ($logger:expr, $($arg:tt)*) => {
        $logger.success(format!($($arg)*), $crate::call_site!())
    };
}

#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warning(format!($($arg)*), $crate::call_site!())
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format!($($arg)*), $crate::call_site!())
    };
}

#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)*) => {
        $logger.critical(format!($($arg)*), $crate::call_site!())
    };
}

/// Logs `$err` at ERROR with a freshly captured traceback (spec §4.4).
#[macro_export]
macro_rules! exception {
    ($logger:expr, $err:expr, $($arg:tt)*) => {
        $logger.exception(format!($($arg)*), &$err, $crate::call_site!())
    };
}

#[cfg(test)]
mod tests {
    use crate::filter::Filter;
    use crate::level::Level;
    use crate::logger::Logger;
    use crate::sink::SinkTarget;
    use std::sync::{Arc, Mutex};

    #[test]
    fn info_macro_reaches_a_registered_handler() {
        let logger = Logger::new();
        let captured: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_captured = Arc::clone(&captured);
        logger.log_to(
            SinkTarget::callable(move |text: &str| {
                sink_captured.lock().unwrap().push(text.to_string());
            }),
            Level::Trace,
            Some("{level}:{message}:{function}"),
            Filter::None,
            Some(false),
            false,
        );
        crate::info!(logger, "count is {}", 3).unwrap();
        let lines = captured.lock().unwrap();
        assert!(lines[0].starts_with("INFO:count is 3:"));
    }

    #[test]
    fn exception_macro_attaches_a_traceback() {
        let logger = Logger::new();
        let captured: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_captured = Arc::clone(&captured);
        logger.log_to(
            SinkTarget::callable(move |text: &str| {
                sink_captured.lock().unwrap().push(text.to_string());
            }),
            Level::Trace,
            Some("{message}"),
            Filter::None,
            Some(false),
            false,
        );
        let err = "boom".to_string();
        crate::exception!(logger, err, "failed").unwrap();
        assert!(captured.lock().unwrap()[0].contains("Traceback"));
    }
}
