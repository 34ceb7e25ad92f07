use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use preventivo_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];

    let fields: &[(&str, String, Option<&str>)] = &[
        ("database.url", config.database.url.clone(), Some("PREVENTIVO_DATABASE_URL")),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            Some("PREVENTIVO_DATABASE_MAX_CONNECTIONS"),
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            Some("PREVENTIVO_DATABASE_TIMEOUT_SECS"),
        ),
        ("llm.provider", format!("{:?}", config.llm.provider), Some("PREVENTIVO_LLM_PROVIDER")),
        (
            "llm.api_key",
            config
                .llm
                .api_key
                .as_ref()
                .map(|key| redact_secret(key.expose_secret()))
                .unwrap_or_else(|| "(unset)".to_string()),
            Some("PREVENTIVO_LLM_API_KEY"),
        ),
        ("llm.model", config.llm.model.clone(), Some("PREVENTIVO_LLM_MODEL")),
        (
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            Some("PREVENTIVO_LLM_TIMEOUT_SECS"),
        ),
        (
            "pricing.tax_rate",
            config.pricing.tax_rate.to_string(),
            Some("PREVENTIVO_PRICING_TAX_RATE"),
        ),
        (
            "pricing.margin_ceiling",
            config.pricing.margin_ceiling.to_string(),
            Some("PREVENTIVO_PRICING_MARGIN_CEILING"),
        ),
        (
            "learning.training_threshold",
            config.learning.training_threshold.to_string(),
            Some("PREVENTIVO_LEARNING_TRAINING_THRESHOLD"),
        ),
        ("preview.ttl_secs", config.preview.ttl_secs.to_string(), Some("PREVENTIVO_PREVIEW_TTL_SECS")),
        ("logging.level", config.logging.level.clone(), Some("PREVENTIVO_LOGGING_LEVEL")),
    ];

    for (key, value, env_var) in fields {
        let source =
            field_source(key, *env_var, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("  {key} = {value}  [{source}]"));
    }

    lines.join("\n")
}

fn redact_secret(value: &str) -> String {
    if value.len() <= 6 {
        "***".to_string()
    } else {
        format!("{}***", &value[..6])
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("preventivo.toml"), PathBuf::from("config/preventivo.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    dotted_key: &str,
    env_var: Option<&str>,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if let Some(var) = env_var {
        if env::var(var).map(|value| !value.trim().is_empty()).unwrap_or(false) {
            return format!("env:{var}");
        }
    }

    if let (Some(doc), Some(path)) = (file_doc, file_path) {
        let mut cursor = Some(doc);
        for part in dotted_key.split('.') {
            cursor = cursor.and_then(|value| value.get(part));
        }
        if cursor.is_some() {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}
