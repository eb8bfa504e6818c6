use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use kbseek_core::retrieval::bedrock::{default_endpoint, DEFAULT_REGION};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::LoadedConfig;

pub fn run(config: LoadedConfig<'_>) -> String {
    let config = match config {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "knowledge_base.id",
        config.knowledge_base.id.as_deref().unwrap_or("<unset>"),
        source("knowledge_base.id", &["KNOWLEDGE_BASE_ID"]),
    ));

    let region_display = match &config.knowledge_base.region {
        Some(region) => region.clone(),
        None => format!("<unset> (client default {DEFAULT_REGION})"),
    };
    lines.push(render_line(
        "knowledge_base.region",
        &region_display,
        source("knowledge_base.region", &["AWS_REGION", "AWS_DEFAULT_REGION"]),
    ));

    let endpoint_display = match &config.knowledge_base.endpoint_url {
        Some(endpoint) => endpoint.clone(),
        None => default_endpoint(config.knowledge_base.region.as_deref().unwrap_or(DEFAULT_REGION)),
    };
    lines.push(render_line(
        "knowledge_base.endpoint_url",
        &endpoint_display,
        source("knowledge_base.endpoint_url", &["KBSEEK_ENDPOINT_URL"]),
    ));
    lines.push(render_line(
        "knowledge_base.timeout_secs",
        &config.knowledge_base.timeout_secs.to_string(),
        source("knowledge_base.timeout_secs", &["KBSEEK_TIMEOUT_SECS"]),
    ));

    let access_key_id = config
        .aws
        .access_key_id
        .as_deref()
        .map(redact_access_key)
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "aws.access_key_id",
        &access_key_id,
        source("aws.access_key_id", &["AWS_ACCESS_KEY_ID"]),
    ));

    let secret_access_key = match &config.aws.secret_access_key {
        Some(secret) if !secret.expose_secret().is_empty() => "<redacted>",
        _ => "<unset>",
    };
    lines.push(render_line(
        "aws.secret_access_key",
        secret_access_key,
        source("aws.secret_access_key", &["AWS_SECRET_ACCESS_KEY"]),
    ));

    let session_token = if config.aws.session_token.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "aws.session_token",
        session_token,
        source("aws.session_token", &["AWS_SESSION_TOKEN"]),
    ));

    lines.push(render_line(
        "aws.profile",
        config.aws.profile.as_deref().unwrap_or("<unset> (default)"),
        source("aws.profile", &["AWS_PROFILE"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["KBSEEK_LOGGING_LEVEL", "KBSEEK_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["KBSEEK_LOGGING_FORMAT", "KBSEEK_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("kbseek.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/kbseek.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
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
    let from_env = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = from_env {
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

fn redact_access_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.len() <= 4 {
        return "<redacted>".to_string();
    }
    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}
