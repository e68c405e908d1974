//! Table-driven tests for configuration loading and validation.


use std::io::Write;

use mockgen::config::{load_config, load_config_from_str};
use mockgen::ConfigError;

/// Represents a single config loading test case.
struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{
            "version": "1.0",
            "vendor": {
                "base_url": "https://api.vendor.test/v2",
                "artwork_url": "https://cdn.test/marker.png"
            }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "vendor": {
                "base_url": "http://localhost:8080",
                "api_key_env": "PRINT_VENDOR_TOKEN",
                "placement": "back",
                "artwork_url": "https://cdn.test/marker.png",
                "format": "jpg",
                "connect_timeout_ms": 500,
                "request_timeout_ms": 5000
            },
            "schedule": {
                "poll_interval_ms": 100,
                "poll_attempts": 5,
                "group_cooldown_ms": 0
            },
            "discovery": { "invalid_url_patterns": ["dummy"] },
            "database_path": "/var/lib/mockgen/mockgen.db",
            "error_log_capacity": 25
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "wrong_version",
        config_json: r#"{
            "version": "2.0",
            "vendor": {
                "base_url": "https://api.vendor.test",
                "artwork_url": "https://cdn.test/marker.png"
            }
        }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "non_http_base_url",
        config_json: r#"{
            "version": "1.0",
            "vendor": {
                "base_url": "ftp://api.vendor.test",
                "artwork_url": "https://cdn.test/marker.png"
            }
        }"#,
        should_succeed: false,
        expected_error: Some("vendor.base_url"),
    },
    ConfigTestCase {
        name: "zero_poll_attempts",
        config_json: r#"{
            "version": "1.0",
            "vendor": {
                "base_url": "https://api.vendor.test",
                "artwork_url": "https://cdn.test/marker.png"
            },
            "schedule": { "poll_attempts": 0 }
        }"#,
        should_succeed: false,
        expected_error: Some("poll_attempts"),
    },
    ConfigTestCase {
        name: "missing_vendor",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: false,
        expected_error: Some("vendor"),
    },
    ConfigTestCase {
        name: "malformed_json",
        config_json: r#"{ "version": "1.0", "#,
        should_succeed: false,
        expected_error: Some("parse config JSON"),
    },
];

#[test]
fn test_config_loading_table() {
    for case in CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("{}: expected success, got {}", case.name, e),
            (false, Ok(_)) => panic!("{}: expected failure", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    assert!(
                        e.to_string().contains(expected),
                        "{}: error '{}' does not contain '{}'",
                        case.name,
                        e,
                        expected
                    );
                }
            }
        }
    }
}

#[test]
fn test_defaults_applied() {
    let config = load_config_from_str(CONFIG_TESTS[0].config_json).unwrap();
    assert_eq!(config.schedule.poll_interval_ms, 2000);
    assert_eq!(config.schedule.poll_attempts, 30);
    assert_eq!(config.schedule.group_cooldown_ms, 60_000);
    assert_eq!(config.error_log_capacity, 10);
    assert_eq!(config.vendor.placement, "front");
    assert_eq!(config.vendor.api_key_env, "MOCKGEN_VENDOR_API_KEY");
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("mockgen.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(CONFIG_TESTS[1].config_json.as_bytes())
        .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.vendor.placement, "back");
    assert_eq!(config.error_log_capacity, 25);
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/mockgen.json").unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}
