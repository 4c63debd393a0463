use scrivener::prelude::*;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn captured_sink(logger: &Logger, min_level: Level) -> Arc<Mutex<Vec<String>>> {
    let captured: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_captured = Arc::clone(&captured);
    logger.log_to(
        SinkTarget::callable(move |text: &str| {
            sink_captured.lock().unwrap().push(text.to_string());
        }),
        min_level,
        Some("{level}|{message}"),
        Filter::None,
        Some(false),
        false,
    );
    captured
}

#[test]
fn basic_logging_reaches_the_sink() {
    let logger = Logger::new();
    let captured = captured_sink(&logger, Level::Trace);

    info!(logger, "Test info message").unwrap();
    debug!(logger, "Test debug message").unwrap();
    error!(logger, "Test error message").unwrap();

    let lines = captured.lock().unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "INFO|Test info message");
    assert_eq!(lines[1], "DEBUG|Test debug message");
    assert_eq!(lines[2], "ERROR|Test error message");
}

#[test]
fn every_level_logs_in_priority_order() {
    assert!(Level::Trace < Level::Debug);
    assert!(Level::Debug < Level::Info);
    assert!(Level::Info < Level::Success);
    assert!(Level::Success < Level::Warning);
    assert!(Level::Warning < Level::Error);
    assert!(Level::Error < Level::Critical);

    assert_eq!(Level::Trace.priority(), 5);
    assert_eq!(Level::Success.priority(), 25);
    assert_eq!(Level::Critical.priority(), 50);
}

#[test]
fn file_sink_creates_the_target_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("test.log");

    let logger = Logger::new();
    let sink = FileSink::new(
        log_path.to_string_lossy().into_owned(),
        RotationTrigger::None,
        RetentionPolicy::None,
        CompressionPolicy::None,
        chrono::Utc::now(),
    )
    .unwrap();
    logger.log_to(SinkTarget::file(sink), Level::Info, None, Filter::None, Some(false), false);

    info!(logger, "File test message").unwrap();
    assert!(log_path.exists());
}

#[test]
fn clear_removes_handlers() {
    let logger = Logger::new();
    let id1 = logger.log_to(SinkTarget::callable(|_: &str| {}), Level::Info, None, Filter::None, Some(false), false);
    let _id2 = logger.log_to(SinkTarget::callable(|_: &str| {}), Level::Info, None, Filter::None, Some(false), false);

    assert_eq!(logger.handler_count(), 2);
    assert_eq!(logger.clear(Some(id1)), 1);
    assert_eq!(logger.handler_count(), 1);
    assert_eq!(logger.clear(None), 1);
    assert_eq!(logger.handler_count(), 0);
}

#[test]
fn level_gate_drops_quieter_records() {
    let logger = Logger::new();
    let captured = captured_sink(&logger, Level::Warning);

    trace!(logger, "Should not log").unwrap();
    debug!(logger, "Should not log").unwrap();
    info!(logger, "Should not log").unwrap();
    warning!(logger, "Should log").unwrap();
    error!(logger, "Should log").unwrap();
    critical!(logger, "Should log").unwrap();

    assert_eq!(captured.lock().unwrap().len(), 3);
}

#[test]
fn context_binding_is_attached_and_can_be_cleared() {
    let logger = Logger::new();
    logger.log_to(SinkTarget::callable(|_: &str| {}), Level::Info, None, Filter::None, Some(false), false);

    logger.bind("user_id", serde_json::json!("12345"));
    logger.bind("session", serde_json::json!("abc-def"));

    info!(logger, "Message with context").unwrap();

    assert_eq!(logger.unbind("user_id"), Some(serde_json::json!("12345")));
    logger.clear_bindings();
    assert_eq!(logger.unbind("session"), None);
}

#[test]
fn level_parses_from_string() {
    assert_eq!("TRACE".parse::<Level>().unwrap(), Level::Trace);
    assert_eq!("debug".parse::<Level>().unwrap(), Level::Debug);
    assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
    assert_eq!("crit".parse::<Level>().unwrap(), Level::Critical);
    assert!("INVALID".parse::<Level>().is_err());
}

#[test]
fn concurrent_logging_does_not_panic_or_lose_records() {
    let logger = Arc::new(Logger::new());
    let captured = captured_sink(&logger, Level::Trace);

    let mut handles = vec![];
    for i in 0..10 {
        let logger_clone = Arc::clone(&logger);
        handles.push(std::thread::spawn(move || {
            for j in 0..100 {
                info!(logger_clone, "Thread {} - Message {}", i, j).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(captured.lock().unwrap().len(), 1000);
}

#[test]
fn namespace_filter_scopes_a_handler() {
    let logger = Logger::new();
    let captured: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_captured = Arc::clone(&captured);
    logger.log_to(
        SinkTarget::callable(move |text: &str| sink_captured.lock().unwrap().push(text.to_string())),
        Level::Trace,
        Some("{message}"),
        Filter::namespace(module_path!()),
        Some(false),
        false,
    );

    info!(logger, "in this module").unwrap();
    assert_eq!(captured.lock().unwrap().len(), 1);
}
