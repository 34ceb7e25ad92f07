use std::env;
use std::sync::{Mutex, OnceLock};

use preventivo_cli::commands::{config, migrate, seed, smoke};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("PREVENTIVO_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_with_invalid_tax_rate() {
    with_env(&[("PREVENTIVO_PRICING_TAX_RATE", "150")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_loads_demo_history_with_valid_env() {
    with_env(
        &[
            ("PREVENTIVO_DATABASE_URL", "sqlite::memory:"),
            ("PREVENTIVO_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = seed::run();
            assert_eq!(result.exit_code, 0, "expected successful seed run");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "seed");
            assert_eq!(payload["status"], "ok");

            let message = payload["message"].as_str().unwrap_or("");
            assert!(message.contains("demo quotes"));
            assert!(message.contains("demo-user"));
        },
    );
}

#[test]
fn seed_is_deterministic_across_runs() {
    with_env(
        &[
            ("PREVENTIVO_DATABASE_URL", "sqlite::memory:"),
            ("PREVENTIVO_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let first = seed::run();
            assert_eq!(first.exit_code, 0, "expected first seed invocation success");
            let first_payload = parse_payload(&first.output);
            assert_eq!(first_payload["status"], "ok");

            let second = seed::run();
            assert_eq!(second.exit_code, 0, "expected second seed invocation success");
            let second_payload = parse_payload(&second.output);
            assert_eq!(second_payload["status"], "ok");

            assert_eq!(first_payload["message"], second_payload["message"]);
        },
    );
}

#[test]
fn smoke_returns_success_report_with_valid_env() {
    with_env(&[("PREVENTIVO_DATABASE_URL", "sqlite::memory:")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 0, "expected successful smoke report");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "pass");
    });
}

#[test]
fn smoke_returns_failure_when_config_invalid() {
    with_env(&[("PREVENTIVO_PRICING_MARGIN_CEILING", "150")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");
    });
}

#[test]
fn config_output_redacts_the_api_key() {
    with_env(
        &[
            ("PREVENTIVO_DATABASE_URL", "sqlite::memory:"),
            ("PREVENTIVO_LLM_API_KEY", "sk-1234567890"),
        ],
        || {
            let output = config::run();

            assert!(output.contains("llm.api_key = sk-123***"));
            assert!(output.contains("env:PREVENTIVO_LLM_API_KEY"));
            assert!(!output.contains("sk-1234567890"));
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PREVENTIVO_DATABASE_URL",
        "PREVENTIVO_DATABASE_MAX_CONNECTIONS",
        "PREVENTIVO_DATABASE_TIMEOUT_SECS",
        "PREVENTIVO_LLM_PROVIDER",
        "PREVENTIVO_LLM_API_KEY",
        "PREVENTIVO_LLM_BASE_URL",
        "PREVENTIVO_LLM_MODEL",
        "PREVENTIVO_LLM_TIMEOUT_SECS",
        "PREVENTIVO_LLM_MAX_RETRIES",
        "PREVENTIVO_PRICING_TAX_RATE",
        "PREVENTIVO_PRICING_MARGIN_CEILING",
        "PREVENTIVO_LEARNING_TRAINING_THRESHOLD",
        "PREVENTIVO_PREVIEW_TTL_SECS",
        "PREVENTIVO_LOGGING_LEVEL",
        "PREVENTIVO_LOGGING_FORMAT",
        "PREVENTIVO_LOG_LEVEL",
        "PREVENTIVO_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
