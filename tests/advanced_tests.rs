use scrivener::prelude::*;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[test]
fn file_rotation_by_size_creates_numbered_backups() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("size.log");

    let logger = Logger::new();
    let sink = FileSink::new(
        log_path.to_string_lossy().into_owned(),
        RotationTrigger::Size(512),
        RetentionPolicy::None,
        CompressionPolicy::None,
        chrono::Utc::now(),
    )
    .unwrap();
    logger.log_to(SinkTarget::file(sink), Level::Info, Some("{message}"), Filter::None, Some(false), false);

    for i in 0..200 {
        info!(logger, "Size rotation test message {}", i).unwrap();
    }

    assert!(log_path.exists());
    assert!(log_path.with_file_name("size.log.1").exists());
}

#[test]
fn multiple_handlers_each_see_every_record() {
    let temp_dir = TempDir::new().unwrap();
    let log_path1 = temp_dir.path().join("sink1.log");
    let log_path2 = temp_dir.path().join("sink2.log");

    let logger = Logger::new();
    for path in [&log_path1, &log_path2] {
        let sink = FileSink::new(
            path.to_string_lossy().into_owned(),
            RotationTrigger::None,
            RetentionPolicy::None,
            CompressionPolicy::None,
            chrono::Utc::now(),
        )
        .unwrap();
        logger.log_to(SinkTarget::file(sink), Level::Info, None, Filter::None, Some(false), false);
    }

    info!(logger, "Multiple sinks test").unwrap();

    assert!(log_path1.exists());
    assert!(log_path2.exists());
    assert!(std::fs::read_to_string(&log_path1).unwrap().contains("Multiple sinks test"));
    assert!(std::fs::read_to_string(&log_path2).unwrap().contains("Multiple sinks test"));
}

#[test]
fn directory_creation_is_recursive() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("nested/dir/test.log");

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

    info!(logger, "Directory creation test").unwrap();

    assert!(log_path.exists());
    assert!(log_path.parent().unwrap().exists());
}

#[test]
fn custom_format_is_honored() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("format.log");

    let logger = Logger::new();
    let sink = FileSink::new(
        log_path.to_string_lossy().into_owned(),
        RotationTrigger::None,
        RetentionPolicy::None,
        CompressionPolicy::None,
        chrono::Utc::now(),
    )
    .unwrap();
    logger.log_to(
        SinkTarget::file(sink),
        Level::Info,
        Some("[{level}] {message}"),
        Filter::None,
        Some(false),
        false,
    );

    info!(logger, "Custom format test").unwrap();

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(contents, "[INFO] Custom format test\n");
}

#[test]
fn bound_fields_persist_until_cleared() {
    let logger = Logger::new();
    logger.log_to(SinkTarget::callable(|_: &str| {}), Level::Info, None, Filter::None, Some(false), false);

    logger.bind("request_id", serde_json::json!("req-123"));
    logger.bind("user", serde_json::json!("alice"));

    info!(logger, "First message").unwrap();
    info!(logger, "Second message").unwrap();

    logger.unbind("request_id");
    info!(logger, "Third message").unwrap();

    logger.clear_bindings();
    info!(logger, "Fourth message").unwrap();
}

#[test]
fn retention_policy_deletes_older_rotated_files() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("retention.log");
    let start = chrono::Utc::now();

    let sink = FileSink::new(
        log_path.to_string_lossy().into_owned(),
        RotationTrigger::Size(64),
        RetentionPolicy::Count(2),
        CompressionPolicy::None,
        start,
    )
    .unwrap();

    let message = "x".repeat(63) + "\n";
    for i in 0..8u32 {
        sink.write(start + chrono::TimeDelta::seconds(i as i64), &message).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    assert!(!log_path.with_file_name("retention.log.3").exists());
}

#[test]
fn catcher_wrap_swallows_and_logs_once() {
    let logger = Logger::new();
    let captured: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_captured = Arc::clone(&captured);
    logger.log_to(
        SinkTarget::callable(move |text: &str| sink_captured.lock().unwrap().push(text.to_string())),
        Level::Trace,
        Some("{message}"),
        Filter::None,
        Some(false),
        false,
    );

    let parse = |s: &str| s.parse::<i32>();
    let result = logger.catch().message("parse failed in {function}").wrap("parse_count", || parse("not-a-number"));

    assert_eq!(result, Ok(None));
    assert_eq!(captured.lock().unwrap().len(), 1);
    assert!(captured.lock().unwrap()[0].contains("parse failed in parse_count"));
}

#[test]
fn exception_macro_logs_a_traceback_with_one_caught_frame() {
    let logger = Logger::new();
    let captured: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_captured = Arc::clone(&captured);
    logger.log_to(
        SinkTarget::callable(move |text: &str| sink_captured.lock().unwrap().push(text.to_string())),
        Level::Trace,
        Some("{message}\n{exception}"),
        Filter::None,
        Some(false),
        false,
    );

    let err = "disk full".to_string();
    exception!(logger, err, "write failed").unwrap();

    let lines = captured.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("write failed"));
    assert!(lines[0].contains("Traceback"));
    assert_eq!(lines[0].matches("> File").count(), 1);
}

#[test]
fn config_registers_sinks_from_a_toml_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("configured.log");
    let config_path = temp_dir.path().join("scrivener.toml");

    std::fs::write(
        &config_path,
        format!(
            r#"
            [[sinks]]
            path = "{}"
            level = "warning"
            "#,
            log_path.to_string_lossy().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    let logger = Logger::new();
    let ids = logger.config_from_path(&config_path).unwrap();
    assert_eq!(ids.len(), 1);

    info!(logger, "Should not appear").unwrap();
    error!(logger, "Should appear").unwrap();

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(!contents.contains("Should not appear"));
    assert!(contents.contains("Should appear"));
}

#[test]
fn reconfiguring_replaces_the_previous_handler_set() {
    let logger = Logger::new();
    logger.log_to(SinkTarget::callable(|_: &str| {}), Level::Info, None, Filter::None, Some(false), false);
    assert_eq!(logger.handler_count(), 1);

    let config = ScrivenerConfig {
        sinks: vec![SinkEntry {
            stderr: true,
            level: Some("error".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };
    logger.config(config).unwrap();
    assert_eq!(logger.handler_count(), 1);
}

#[test]
fn high_volume_logging_completes_quickly() {
    let logger = Logger::new();
    logger.log_to(SinkTarget::callable(|_: &str| {}), Level::Info, None, Filter::None, Some(false), false);

    let start = std::time::Instant::now();
    for i in 0..10_000 {
        info!(logger, "High throughput message {}", i).unwrap();
    }
    assert!(start.elapsed().as_secs() < 5);
}
