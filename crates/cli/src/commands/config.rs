use std::env;
use std::fs;
use std::path::Path;

use ratebook_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "rates.directory",
        &config.rates.directory.display().to_string(),
        source("rates.directory", &["RATEBOOK_RATES_DIRECTORY"]),
    ));
    lines.push(render_line(
        "engine.variance_enabled",
        &config.engine.variance_enabled.to_string(),
        source("engine.variance_enabled", &["RATEBOOK_ENGINE_VARIANCE_ENABLED"]),
    ));
    lines.push(render_line(
        "engine.variance_seed",
        &optional(config.engine.variance_seed),
        source("engine.variance_seed", &["RATEBOOK_ENGINE_VARIANCE_SEED"]),
    ));
    let reference_year = match config.engine.reference_year {
        Some(year) => year.to_string(),
        None => format!("<current: {}>", config.engine_options().reference_year),
    };
    lines.push(render_line(
        "engine.reference_year",
        &reference_year,
        source("engine.reference_year", &["RATEBOOK_ENGINE_REFERENCE_YEAR"]),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["RATEBOOK_LOGGING_LEVEL", "RATEBOOK_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["RATEBOOK_LOGGING_FORMAT", "RATEBOOK_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "<unset>".to_string(), |value| value.to_string())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
