use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use folio_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct ConfigField {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

fn field(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> ConfigField {
    ConfigField { key, value: value.into(), env_keys }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<ConfigField> {
    vec![
        field("owner.name", &config.owner.name, &["FOLIO_OWNER_NAME"]),
        field("owner.email", &config.owner.email, &["FOLIO_OWNER_EMAIL"]),
        field("owner.role", &config.owner.role, &["FOLIO_OWNER_ROLE"]),
        field("owner.company", &config.owner.company, &["FOLIO_OWNER_COMPANY"]),
        field(
            "guard.max_message_length",
            config.guard.max_message_length.to_string(),
            &["FOLIO_GUARD_MAX_MESSAGE_LENGTH"],
        ),
        field(
            "guard.max_messages_per_session",
            config.guard.max_messages_per_session.to_string(),
            &["FOLIO_GUARD_MAX_MESSAGES_PER_SESSION"],
        ),
        field(
            "guard.rate_limit_ms",
            config.guard.rate_limit_ms.to_string(),
            &["FOLIO_GUARD_RATE_LIMIT_MS"],
        ),
        field(
            "guard.max_lead_submissions_per_session",
            config.guard.max_lead_submissions_per_session.to_string(),
            &["FOLIO_GUARD_MAX_LEAD_SUBMISSIONS_PER_SESSION"],
        ),
        field(
            "pacing.min_delay_ms",
            config.pacing.min_delay_ms.to_string(),
            &["FOLIO_PACING_MIN_DELAY_MS"],
        ),
        field(
            "pacing.max_delay_ms",
            config.pacing.max_delay_ms.to_string(),
            &["FOLIO_PACING_MAX_DELAY_MS"],
        ),
        field(
            "remote.endpoint",
            config.remote.endpoint.as_deref().map(redact_url).unwrap_or_else(|| "<unset>".to_string()),
            &["FOLIO_REMOTE_ENDPOINT"],
        ),
        field(
            "remote.timeout_secs",
            config.remote.timeout_secs.to_string(),
            &["FOLIO_REMOTE_TIMEOUT_SECS"],
        ),
        field("email.enabled", config.email.enabled.to_string(), &["FOLIO_EMAIL_ENABLED"]),
        field("email.api_url", &config.email.api_url, &["FOLIO_EMAIL_API_URL"]),
        field("email.service_id", &config.email.service_id, &["FOLIO_EMAIL_SERVICE_ID"]),
        field("email.template_id", &config.email.template_id, &["FOLIO_EMAIL_TEMPLATE_ID"]),
        field(
            "email.public_key",
            redact_key(config.email.public_key.expose_secret()),
            &["FOLIO_EMAIL_PUBLIC_KEY"],
        ),
        field(
            "sheets.webhook_url",
            config.sheets.webhook_url.as_deref().map(redact_url).unwrap_or_else(|| "<unset>".to_string()),
            &["FOLIO_SHEETS_WEBHOOK_URL"],
        ),
        field("server.bind_address", &config.server.bind_address, &["FOLIO_SERVER_BIND_ADDRESS"]),
        field("server.port", config.server.port.to_string(), &["FOLIO_SERVER_PORT"]),
        field(
            "server.session_idle_secs",
            config.server.session_idle_secs.to_string(),
            &["FOLIO_SERVER_SESSION_IDLE_SECS"],
        ),
        field(
            "server.max_sessions",
            config.server.max_sessions.to_string(),
            &["FOLIO_SERVER_MAX_SESSIONS"],
        ),
        field("logging.level", &config.logging.level, &["FOLIO_LOGGING_LEVEL", "FOLIO_LOG_LEVEL"]),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["FOLIO_LOGGING_FORMAT", "FOLIO_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["folio.toml", "config/folio.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
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

/// Keeps the first four characters of a key so operators can tell keys apart.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let visible: String = trimmed.chars().take(4).collect();
    if visible.len() < trimmed.len() {
        return format!("{visible}***");
    }

    "<redacted>".to_string()
}

/// Webhook and endpoint paths often embed deployment secrets; only the
/// scheme and host are shown.
fn redact_url(url: &str) -> String {
    let trimmed = url.trim();
    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return "<redacted>".to_string();
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if rest.len() > host.len() {
        format!("{scheme}://{host}/***")
    } else {
        format!("{scheme}://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_key, redact_url};

    #[test]
    fn keys_keep_a_short_prefix() {
        assert_eq!(redact_key("pk-live-abcdef"), "pk-l***");
        assert_eq!(redact_key("abcd"), "<redacted>");
        assert_eq!(redact_key("  "), "<empty>");
    }

    #[test]
    fn urls_keep_scheme_and_host_only() {
        assert_eq!(
            redact_url("https://script.google.com/macros/s/SECRET/exec"),
            "https://script.google.com/***"
        );
        assert_eq!(redact_url("http://localhost:8787"), "http://localhost:8787");
        assert_eq!(redact_url("not a url"), "<redacted>");
    }

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc: toml::Value = "[owner]\nname = \"Ann\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "owner.name"));
        assert!(!contains_path(&doc, "owner.email"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
