use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const KNOWLEDGE_BASE_ID_ENV: &str = "KNOWLEDGE_BASE_ID";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub knowledge_base: KnowledgeBaseConfig,
    pub aws: AwsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct KnowledgeBaseConfig {
    /// Left unset is legal at load time; `retrieve` reports it per invocation.
    pub id: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct AwsConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<SecretString>,
    pub session_token: Option<SecretString>,
    /// Shared-config profile consulted when no access keys are configured.
    pub profile: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub knowledge_base_id: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            knowledge_base: KnowledgeBaseConfig {
                id: None,
                region: None,
                endpoint_url: None,
                timeout_secs: 30,
            },
            aws: AwsConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AwsConfig {
    pub fn has_credentials(&self) -> bool {
        let has_secret = self
            .secret_access_key
            .as_ref()
            .map(|value| !value.expose_secret().trim().is_empty())
            .unwrap_or(false);
        self.access_key_id.is_some() && has_secret
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("kbseek.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(knowledge_base) = patch.knowledge_base {
            if let Some(id) = knowledge_base.id {
                self.knowledge_base.id = Some(id);
            }
            if let Some(region) = knowledge_base.region {
                self.knowledge_base.region = Some(region);
            }
            if let Some(endpoint_url) = knowledge_base.endpoint_url {
                self.knowledge_base.endpoint_url = Some(endpoint_url);
            }
            if let Some(timeout_secs) = knowledge_base.timeout_secs {
                self.knowledge_base.timeout_secs = timeout_secs;
            }
        }

        if let Some(aws) = patch.aws {
            if let Some(access_key_id) = aws.access_key_id {
                self.aws.access_key_id = Some(access_key_id);
            }
            if let Some(secret_access_key) = aws.secret_access_key {
                self.aws.secret_access_key = Some(secret_value(secret_access_key));
            }
            if let Some(session_token) = aws.session_token {
                self.aws.session_token = Some(secret_value(session_token));
            }
            if let Some(profile) = aws.profile {
                self.aws.profile = Some(profile);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env(KNOWLEDGE_BASE_ID_ENV) {
            self.knowledge_base.id = Some(value);
        }
        let region = read_env("AWS_REGION").or_else(|| read_env("AWS_DEFAULT_REGION"));
        if let Some(value) = region {
            self.knowledge_base.region = Some(value);
        }
        if let Some(value) = read_env("KBSEEK_ENDPOINT_URL") {
            self.knowledge_base.endpoint_url = Some(value);
        }
        if let Some(value) = read_env("KBSEEK_TIMEOUT_SECS") {
            self.knowledge_base.timeout_secs = parse_u64("KBSEEK_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AWS_ACCESS_KEY_ID") {
            self.aws.access_key_id = Some(value);
        }
        if let Some(value) = read_env("AWS_SECRET_ACCESS_KEY") {
            self.aws.secret_access_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("AWS_SESSION_TOKEN") {
            self.aws.session_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("AWS_PROFILE") {
            self.aws.profile = Some(value);
        }

        let log_level = read_env("KBSEEK_LOGGING_LEVEL").or_else(|| read_env("KBSEEK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("KBSEEK_LOGGING_FORMAT").or_else(|| read_env("KBSEEK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(knowledge_base_id) = overrides.knowledge_base_id {
            self.knowledge_base.id = Some(knowledge_base_id);
        }
        if let Some(region) = overrides.region {
            self.knowledge_base.region = Some(region);
        }
        if let Some(endpoint_url) = overrides.endpoint_url {
            self.knowledge_base.endpoint_url = Some(endpoint_url);
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.knowledge_base.timeout_secs = timeout_secs;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_knowledge_base(&self.knowledge_base)?;
        validate_aws(&self.aws)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("kbseek.toml"), PathBuf::from("config/kbseek.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_knowledge_base(knowledge_base: &KnowledgeBaseConfig) -> Result<(), ConfigError> {
    if knowledge_base.timeout_secs == 0 || knowledge_base.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "knowledge_base.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if let Some(region) = &knowledge_base.region {
        let well_formed = !region.is_empty()
            && region.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
        if !well_formed {
            return Err(ConfigError::Validation(format!(
                "knowledge_base.region `{region}` is not a valid region name (e.g. `us-east-1`)"
            )));
        }
    }

    if let Some(endpoint_url) = &knowledge_base.endpoint_url {
        if !endpoint_url.starts_with("http://") && !endpoint_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "knowledge_base.endpoint_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_aws(aws: &AwsConfig) -> Result<(), ConfigError> {
    let has_key_id = aws.access_key_id.is_some();
    let has_secret = aws.secret_access_key.is_some();
    if has_key_id != has_secret {
        return Err(ConfigError::Validation(
            "aws.access_key_id and aws.secret_access_key must be configured together".to_string(),
        ));
    }

    if aws.session_token.is_some() && !has_key_id {
        return Err(ConfigError::Validation(
            "aws.session_token requires aws.access_key_id and aws.secret_access_key".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    knowledge_base: Option<KnowledgeBasePatch>,
    aws: Option<AwsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeBasePatch {
    id: Option<String>,
    region: Option<String>,
    endpoint_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AwsPatch {
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    session_token: Option<String>,
    profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::test_support::env_lock;

    const ENV_KEYS: &[&str] = &[
        "KNOWLEDGE_BASE_ID",
        "AWS_REGION",
        "AWS_DEFAULT_REGION",
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        "AWS_PROFILE",
        "KBSEEK_ENDPOINT_URL",
        "KBSEEK_TIMEOUT_SECS",
        "KBSEEK_LOGGING_LEVEL",
        "KBSEEK_LOG_LEVEL",
        "KBSEEK_LOGGING_FORMAT",
        "KBSEEK_LOG_FORMAT",
        "TEST_KBSEEK_KB_ID",
    ];

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn missing_knowledge_base_id_is_not_a_load_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.knowledge_base.id.is_none(), "knowledge base id should default to unset")?;
        ensure(config.knowledge_base.region.is_none(), "region should default to unset")?;
        ensure(config.knowledge_base.timeout_secs == 30, "timeout should default to 30s")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("TEST_KBSEEK_KB_ID", "KBFROMENV01");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("kbseek.toml");
            fs::write(
                &path,
                r#"
[knowledge_base]
id = "${TEST_KBSEEK_KB_ID}"
region = "ap-northeast-1"
timeout_secs = 12

[logging]
format = "json"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.knowledge_base.id.as_deref() == Some("KBFROMENV01"),
                "knowledge base id should be interpolated from environment",
            )?;
            ensure(
                config.knowledge_base.region.as_deref() == Some("ap-northeast-1"),
                "region should be loaded from file",
            )?;
            ensure(config.knowledge_base.timeout_secs == 12, "timeout should be loaded from file")?;
            ensure(config.logging.format == LogFormat::Json, "log format should be loaded from file")
        })();

        clear_vars(&["TEST_KBSEEK_KB_ID"]);
        result
    }

    #[test]
    fn env_overrides_file_and_overrides_win_over_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("KNOWLEDGE_BASE_ID", "KBENV00001");
        env::set_var("AWS_DEFAULT_REGION", "eu-west-1");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.knowledge_base.id.as_deref() == Some("KBENV00001"),
                "KNOWLEDGE_BASE_ID should populate knowledge_base.id",
            )?;
            ensure(
                config.knowledge_base.region.as_deref() == Some("eu-west-1"),
                "AWS_DEFAULT_REGION should be used when AWS_REGION is unset",
            )?;

            env::set_var("AWS_REGION", "us-west-2");
            let config = AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    knowledge_base_id: Some("KBOVERRIDE".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.knowledge_base.id.as_deref() == Some("KBOVERRIDE"),
                "explicit overrides should win over environment",
            )?;
            ensure(
                config.knowledge_base.region.as_deref() == Some("us-west-2"),
                "AWS_REGION should win over AWS_DEFAULT_REGION",
            )
        })();

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn blank_knowledge_base_id_env_is_treated_as_unset() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);
        env::set_var("KNOWLEDGE_BASE_ID", "   ");

        let result = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))
            .and_then(|config| {
                ensure(config.knowledge_base.id.is_none(), "blank id should be ignored")
            });

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn unpaired_credentials_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);
        env::set_var("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("load should fail without a secret access key".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("aws.secret_access_key")
            );
            ensure(has_message, "validation failure should mention aws.secret_access_key")
        })();

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn invalid_timeout_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);
        env::set_var("KBSEEK_TIMEOUT_SECS", "soon");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "KBSEEK_TIMEOUT_SECS", "override error should name the key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("load should fail for a non-numeric timeout".to_string()),
        };

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn endpoint_override_requires_http_scheme() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                endpoint_url: Some("bedrock.local:8080".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("endpoint_url")),
            "endpoint without scheme should be rejected",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE");
        env::set_var("AWS_SECRET_ACCESS_KEY", "secret-access-value");
        env::set_var("AWS_SESSION_TOKEN", "session-token-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("secret-access-value"),
                "debug output should not contain the secret access key",
            )?;
            ensure(
                !debug.contains("session-token-value"),
                "debug output should not contain the session token",
            )?;
            ensure(config.aws.has_credentials(), "credentials should be reported as present")?;
            ensure(
                config
                    .aws
                    .secret_access_key
                    .as_ref()
                    .map(|secret| secret.expose_secret() == "secret-access-value")
                    .unwrap_or(false),
                "secret should still be readable through expose_secret",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn aws_profile_comes_from_file_and_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("kbseek.toml");
            fs::write(&path, "[aws]\nprofile = \"analytics\"\n").map_err(|err| err.to_string())?;

            let options = LoadOptions { config_path: Some(path), ..LoadOptions::default() };
            let config = AppConfig::load(options.clone())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.aws.profile.as_deref() == Some("analytics"),
                "profile should be loaded from file",
            )?;
            ensure(!config.aws.has_credentials(), "a profile alone is not static credentials")?;

            env::set_var("AWS_PROFILE", "ops");
            let config =
                AppConfig::load(options).map_err(|err| format!("config load failed: {err}"))?;
            ensure(config.aws.profile.as_deref() == Some("ops"), "AWS_PROFILE should win over file")
        })();

        clear_vars(ENV_KEYS);
        result
    }
}
