use std::env;
use std::fs;
use std::path::Path;

use frontdesk_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = AppConfig::source_path(options);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let optional = |value: Option<String>| value.unwrap_or_else(|| "<unset>".to_string());
    let fields: [(&str, String, &[&str]); 12] = [
        ("database.url", config.database.url.clone(), &["FRONTDESK_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["FRONTDESK_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["FRONTDESK_DATABASE_TIMEOUT_SECS"],
        ),
        ("practice.name", config.practice.name.clone(), &["FRONTDESK_PRACTICE_NAME"]),
        ("practice.phone", config.practice.phone.clone(), &["FRONTDESK_PRACTICE_PHONE"]),
        (
            "practice.reference_date",
            optional(config.practice.reference_date.map(|date| date.to_string())),
            &["FRONTDESK_PRACTICE_REFERENCE_DATE"],
        ),
        (
            "booking.deployment_year",
            optional(config.booking.deployment_year.map(|year| year.to_string())),
            &["FRONTDESK_BOOKING_DEPLOYMENT_YEAR"],
        ),
        (
            "booking.default_window_days",
            config.booking.default_window_days.to_string(),
            &["FRONTDESK_BOOKING_DEFAULT_WINDOW_DAYS"],
        ),
        (
            "booking.emergency_dedup_window_secs",
            config.booking.emergency_dedup_window_secs.to_string(),
            &["FRONTDESK_BOOKING_EMERGENCY_DEDUP_WINDOW_SECS"],
        ),
        (
            "session.idle_timeout_secs",
            config.session.idle_timeout_secs.to_string(),
            &["FRONTDESK_SESSION_IDLE_TIMEOUT_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["FRONTDESK_LOGGING_LEVEL", "FRONTDESK_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["FRONTDESK_LOGGING_FORMAT", "FRONTDESK_LOG_FORMAT"],
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        let source = field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }
    lines.join("\n")
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

#[cfg(test)]
mod tests {
    use super::contains_path;

    #[test]
    fn dotted_paths_resolve_nested_tables() {
        let doc = "[booking]\ndefault_window_days = 10\n".parse::<toml::Value>().expect("toml");

        assert!(contains_path(&doc, "booking.default_window_days"));
        assert!(!contains_path(&doc, "booking.deployment_year"));
        assert!(!contains_path(&doc, "session.idle_timeout_secs"));
    }
}
