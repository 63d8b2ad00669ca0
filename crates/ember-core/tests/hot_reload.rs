//! End-to-end: YAML document -> registry -> reconciler -> live loggers.

use ember_core::config::ConfigRegistry;
use ember_core::log::{self, LoggerManager};
use ember_core::{log_info, log_warn, LogLevel};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (ConfigRegistry, Arc<LoggerManager>) {
    let registry = ConfigRegistry::new();
    let manager = Arc::new(LoggerManager::new());
    log::install(&registry, manager.clone()).unwrap();
    (registry, manager)
}

#[test]
fn test_file_logger_from_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs").join("system.log");
    let (registry, manager) = setup();

    let document = format!(
        "logs:\n  - name: system\n    level: INFO\n    pattern: \"%p %m%n\"\n    appender:\n      - type: FileLogAppender\n        file: {}\n",
        path.display()
    );
    let summary = registry.load_from_str(&document).unwrap();
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.failed, 0);

    let logger = manager.find("system").unwrap();
    assert_eq!(logger.level(), LogLevel::Info);
    log_info!(logger, "started on port {}", 8080);
    logger.debug("filtered out");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "INFO started on port 8080\n");
}

#[test]
fn test_reload_changes_level_and_mutes_removed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let (registry, manager) = setup();

    let first = format!(
        "logs:\n  - name: app\n    level: DEBUG\n    appender:\n      - type: FileLogAppender\n        file: {}\n        pattern: \"%c %m%n\"\n  - name: audit\n    level: INFO\n    appender:\n      - type: StdoutLogAppender\n",
        path.display()
    );
    registry.load_from_str(&first).unwrap();
    let app = manager.find("app").unwrap();
    app.debug("one");

    let second = format!(
        "logs:\n  - name: app\n    level: WARN\n    appender:\n      - type: FileLogAppender\n        file: {}\n        pattern: \"%c %m%n\"\n",
        path.display()
    );
    registry.load_from_str(&second).unwrap();

    app.info("two");
    log_warn!(app, "three");
    assert_eq!(fs::read_to_string(&path).unwrap(), "app one\napp three\n");
    assert_eq!(app.appenders().len(), 1);

    let audit = manager.find("audit").unwrap();
    assert_eq!(audit.level(), LogLevel::Off);
    assert!(audit.appenders().is_empty());
}

#[test]
fn test_malformed_entries_do_not_block_others() {
    let (registry, manager) = setup();
    let port = registry.lookup_or_create("system.port", 8080u16, "port").unwrap();

    let document = "system:\n  port: not-a-number\nlogs:\n  - name: ok\n    level: ERROR\n    appender:\n      - type: StdoutLogAppender\n  - name: bad\n    level: INFO\n    appender:\n      - type: FileLogAppender\n";
    let summary = registry.load_from_str(document).unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.applied, 1);

    assert_eq!(port.get_value(), 8080);
    assert_eq!(manager.find("ok").unwrap().level(), LogLevel::Error);
    assert!(manager.find("bad").is_none());
}

#[test]
fn test_export_reflects_loaded_config() {
    let (registry, _manager) = setup();
    registry
        .lookup_or_create("system.name", "ember".to_string(), "service name")
        .unwrap();
    registry
        .load_from_str("system:\n  name: reloaded\nlogs:\n  - name: root\n    level: INFO\n")
        .unwrap();

    let exported = registry.to_yaml_string().unwrap();
    let fresh = ConfigRegistry::new();
    let name = fresh
        .lookup_or_create("system.name", String::new(), "")
        .unwrap();
    fresh.load_from_str(&exported).unwrap();
    assert_eq!(name.get_value(), "reloaded");
}
