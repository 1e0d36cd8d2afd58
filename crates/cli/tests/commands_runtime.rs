use std::env;
use std::sync::{Mutex, OnceLock};

use folio_cli::commands::{chat, config, doctor};
use serde_json::Value;

#[test]
fn config_reports_defaults_with_source_attribution() {
    with_env(&[], || {
        let output = config::run();

        assert!(output.starts_with("effective config"));
        assert!(output.contains("- owner.name = Ilyas (source: default)"));
        assert!(output.contains("- server.port = 8080 (source: default)"));
        assert!(output.contains("- remote.endpoint = <unset> (source: default)"));
    });
}

#[test]
fn config_attributes_env_values_and_redacts_secrets() {
    with_env(
        &[
            ("FOLIO_OWNER_NAME", "Ann Example"),
            ("FOLIO_LOG_LEVEL", "debug"),
            ("FOLIO_SHEETS_WEBHOOK_URL", "https://script.google.com/macros/s/SECRET/exec"),
            ("FOLIO_EMAIL_PUBLIC_KEY", "pk-live-123456"),
        ],
        || {
            let output = config::run();

            assert!(output.contains("- owner.name = Ann Example (source: env (FOLIO_OWNER_NAME))"));
            assert!(output.contains("- logging.level = debug (source: env (FOLIO_LOG_LEVEL))"));
            assert!(output.contains("- sheets.webhook_url = https://script.google.com/***"));
            assert!(output.contains("- email.public_key = pk-l***"));
            assert!(!output.contains("SECRET"));
            assert!(!output.contains("123456"));
        },
    );
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("FOLIO_SERVER_PORT", "not-a-port")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed"), "unexpected output: {output}");
    });
}

#[test]
fn doctor_json_passes_with_defaults() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert!(result.is_success(), "expected doctor success, got {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().cloned().unwrap_or_default();
        let canned = checks.iter().find(|check| check["name"] == "canned_turn");
        assert_eq!(canned.map(|check| check["status"].clone()), Some(Value::from("pass")));
    });
}

#[test]
fn doctor_fails_when_config_is_invalid() {
    with_env(&[("FOLIO_OWNER_EMAIL", "nobody")], || {
        let result = doctor::run(false);

        assert_eq!(result.exit_code, 5);
        assert!(result.output.contains("- [fail] config_validation"));
        assert!(result.output.contains("- [skip] canned_turn"));
    });
}

#[test]
fn chat_returns_config_failure_before_reading_input() {
    with_env(&[("FOLIO_OWNER_EMAIL", "nobody")], || {
        let result = chat::run(chat::ChatOptions::default());
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "chat");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys: Vec<String> = env::vars().map(|(key, _)| key).filter(|key| key.starts_with("FOLIO_")).collect();
    let previous_values: Vec<(String, Option<String>)> =
        keys.iter().map(|key| (key.clone(), env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, _) in vars {
        env::remove_var(key);
    }
    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        }
    }
}
