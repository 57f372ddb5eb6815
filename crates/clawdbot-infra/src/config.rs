//! Configuration loader for the relay.
//!
//! Settings come from an optional TOML file overridden by environment
//! variables, then validated into [`Settings`]. Missing required settings
//! are a fatal [`ConfigError`]; the process refuses to start.

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use clawdbot_types::error::ConfigError;
use clawdbot_types::llm::{ProviderConfig, ProviderKind};
use clawdbot_types::message::Principal;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_ALLOWED_IDS: &str = "TELEGRAM_ALLOWED_IDS";
pub const ENV_LOCAL_BASE: &str = "LOCAL_LLM_API_BASE";
pub const ENV_LOCAL_MODEL: &str = "LOCAL_LLM_MODEL";
pub const ENV_LOCAL_TIMEOUT: &str = "LOCAL_LLM_TIMEOUT";
pub const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";
pub const ENV_PORT: &str = "PORT";
pub const ENV_HEALTH_INTERVAL: &str = "HEALTH_CHECK_INTERVAL";
pub const ENV_PROBE_TIMEOUT: &str = "PROBE_TIMEOUT";
pub const ENV_RESTART_EXIT_CODE: &str = "RESTART_EXIT_CODE";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOCAL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
/// `EX_TEMPFAIL`: tells the supervisor the exit is transient and to restart.
pub const DEFAULT_RESTART_EXIT_CODE: i32 = 75;

pub const LOCAL_PROVIDER_ID: &str = "LOCAL";
pub const OPENAI_PROVIDER_ID: &str = "OPENAI";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_TIMEOUT_SECS: u64 = 30;

/// Raw contents of the optional TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bot_token: Option<String>,
    pub allowed_principals: Option<Vec<String>>,
    pub port: Option<u16>,
    pub health_interval_secs: Option<u64>,
    pub probe_timeout_secs: Option<u64>,
    pub restart_exit_code: Option<i32>,
    #[serde(default)]
    pub local: LocalSection,
    #[serde(default)]
    pub fallbacks: Vec<FallbackSection>,
}

/// `[local]` table: the primary provider reached through the tunnel.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[[fallbacks]]` entry: an extra OpenAI-compatible fallback.
///
/// The key is read from the environment variable named by `api_key_env` so
/// secrets never live in the file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackSection {
    pub id: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: Option<u64>,
    pub api_key_env: Option<String>,
}

/// Validated runtime settings.
#[derive(Debug)]
pub struct Settings {
    pub bot_token: SecretString,
    pub allowed_principals: Vec<Principal>,
    pub port: u16,
    pub health_interval: Duration,
    pub probe_timeout: Duration,
    pub restart_exit_code: i32,
    /// Failover order, local primary first.
    pub providers: Vec<ProviderConfig>,
}

impl Settings {
    /// Credential-free view for `check-config` and startup logs.
    pub fn redacted(&self) -> RedactedSettings {
        RedactedSettings {
            bot_token: "[REDACTED]".to_string(),
            allowed_principals: self
                .allowed_principals
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            port: self.port,
            health_interval_secs: self.health_interval.as_secs(),
            probe_timeout_secs: self.probe_timeout.as_secs(),
            restart_exit_code: self.restart_exit_code,
            providers: self
                .providers
                .iter()
                .map(|p| ProviderSummary {
                    id: p.id.clone(),
                    kind: p.kind,
                    endpoint: p.endpoint_host().to_string(),
                    model: p.model.clone(),
                    timeout_secs: p.request_timeout.as_secs(),
                    api_key_set: p.api_key.is_some(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RedactedSettings {
    pub bot_token: String,
    pub allowed_principals: Vec<String>,
    pub port: u16,
    pub health_interval_secs: u64,
    pub probe_timeout_secs: u64,
    pub restart_exit_code: i32,
    pub providers: Vec<ProviderSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub id: String,
    pub kind: ProviderKind,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub api_key_set: bool,
}

/// Load settings from `path` (if given) and the process environment.
pub async fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    load_settings_with(path, |key| std::env::var(key).ok()).await
}

/// Load settings with an explicit environment lookup.
///
/// Empty values are treated as unset.
pub async fn load_settings_with<F>(path: Option<&Path>, env: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(path) => read_file_config(path).await?,
        None => FileConfig::default(),
    };
    resolve(file, |key| env(key).filter(|v| !v.trim().is_empty()))
}

async fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    tracing::debug!(path = %path.display(), "Loaded config file");
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Merge the file with environment overrides and validate.
fn resolve<F>(file: FileConfig, env: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let bot_token = env(ENV_BOT_TOKEN)
        .or(file.bot_token)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::Missing(ENV_BOT_TOKEN))?;

    let allowed_principals: Vec<Principal> = match env(ENV_ALLOWED_IDS) {
        Some(list) => list.split(',').map(Principal::new).collect(),
        None => file
            .allowed_principals
            .unwrap_or_default()
            .into_iter()
            .map(Principal::new)
            .collect(),
    };
    let allowed_principals: Vec<Principal> = allowed_principals
        .into_iter()
        .filter(|p| !p.as_str().is_empty())
        .collect();
    if allowed_principals.is_empty() {
        return Err(ConfigError::Missing(ENV_ALLOWED_IDS));
    }

    let local_base = env(ENV_LOCAL_BASE)
        .or(file.local.base_url)
        .ok_or(ConfigError::Missing(ENV_LOCAL_BASE))?;
    validate_url(ENV_LOCAL_BASE, &local_base)?;
    let local_model = env(ENV_LOCAL_MODEL)
        .or(file.local.model)
        .filter(|m| !m.trim().is_empty())
        .ok_or(ConfigError::Missing(ENV_LOCAL_MODEL))?;
    let local_timeout = seconds(
        ENV_LOCAL_TIMEOUT,
        env(ENV_LOCAL_TIMEOUT),
        file.local.timeout_secs,
        DEFAULT_LOCAL_TIMEOUT_SECS,
    )?;

    let port = match env(ENV_PORT) {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::invalid(ENV_PORT, e.to_string()))?,
        None => file.port.unwrap_or(DEFAULT_PORT),
    };
    let health_interval = seconds(
        ENV_HEALTH_INTERVAL,
        env(ENV_HEALTH_INTERVAL),
        file.health_interval_secs,
        DEFAULT_HEALTH_INTERVAL_SECS,
    )?;
    let probe_timeout = seconds(
        ENV_PROBE_TIMEOUT,
        env(ENV_PROBE_TIMEOUT),
        file.probe_timeout_secs,
        DEFAULT_PROBE_TIMEOUT_SECS,
    )?;
    let restart_exit_code = match env(ENV_RESTART_EXIT_CODE) {
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .map_err(|e| ConfigError::invalid(ENV_RESTART_EXIT_CODE, e.to_string()))?,
        None => file.restart_exit_code.unwrap_or(DEFAULT_RESTART_EXIT_CODE),
    };
    if !(1..=255).contains(&restart_exit_code) {
        return Err(ConfigError::invalid(
            ENV_RESTART_EXIT_CODE,
            "must be between 1 and 255",
        ));
    }

    let mut providers = vec![ProviderConfig::local(
        LOCAL_PROVIDER_ID,
        local_base,
        local_model,
        local_timeout,
    )];

    if let Some(key) = env(ENV_OPENAI_KEY) {
        providers.push(ProviderConfig::fallback(
            OPENAI_PROVIDER_ID,
            OPENAI_BASE_URL,
            OPENAI_MODEL,
            Duration::from_secs(OPENAI_TIMEOUT_SECS),
            Some(SecretString::from(key)),
        ));
    }

    for fallback in file.fallbacks {
        let field = format!("fallbacks.{}", fallback.id);
        validate_url(&field, &fallback.base_url)?;
        let timeout = seconds(&field, None, fallback.timeout_secs, OPENAI_TIMEOUT_SECS)?;
        let api_key = match &fallback.api_key_env {
            Some(var) => Some(SecretString::from(env(var).ok_or_else(|| {
                ConfigError::invalid(
                    format!("{field}.api_key_env"),
                    format!("environment variable {var} is not set"),
                )
            })?)),
            None => None,
        };
        providers.push(ProviderConfig::fallback(
            fallback.id,
            fallback.base_url,
            fallback.model,
            timeout,
            api_key,
        ));
    }

    Ok(Settings {
        bot_token: SecretString::from(bot_token),
        allowed_principals,
        port,
        health_interval,
        probe_timeout,
        restart_exit_code,
        providers,
    })
}

/// Resolve a positive duration in seconds: env, then file, then default.
fn seconds(
    field: &str,
    env_value: Option<String>,
    file_value: Option<u64>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = match env_value {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::invalid(field, e.to_string()))?,
        None => file_value.unwrap_or(default),
    };
    if secs == 0 {
        return Err(ConfigError::invalid(field, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

fn validate_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(raw).map_err(|e| ConfigError::invalid(field, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(
            field,
            format!("unsupported scheme '{other}', expected http or https"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_BOT_TOKEN, "123:abc"),
            (ENV_ALLOWED_IDS, "111, 222"),
            (ENV_LOCAL_BASE, "https://tunnel.trycloudflare.com/v1/"),
            (ENV_LOCAL_MODEL, "llama3"),
        ]
    }

    #[tokio::test]
    async fn env_only_settings_use_defaults() {
        let settings = load_settings_with(None, env_of(&required())).await.unwrap();

        assert_eq!(settings.bot_token.expose_secret(), "123:abc");
        assert_eq!(
            settings.allowed_principals,
            vec![Principal::from("111"), Principal::from("222")]
        );
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.health_interval, Duration::from_secs(60));
        assert_eq!(settings.probe_timeout, Duration::from_secs(10));
        assert_eq!(settings.restart_exit_code, 75);
        assert_eq!(settings.providers.len(), 1);

        let local = &settings.providers[0];
        assert_eq!(local.id, "LOCAL");
        assert_eq!(local.kind, ProviderKind::Local);
        assert_eq!(local.base_url, "https://tunnel.trycloudflare.com/v1");
        assert_eq!(local.request_timeout, Duration::from_secs(60));
        assert!(local.api_key.is_none());
    }

    #[tokio::test]
    async fn openai_key_adds_fallback() {
        let mut vars = required();
        vars.push((ENV_OPENAI_KEY, "sk-live"));
        let settings = load_settings_with(None, env_of(&vars)).await.unwrap();

        let ids: Vec<_> = settings.providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["LOCAL", "OPENAI"]);
        let openai = &settings.providers[1];
        assert_eq!(openai.base_url, OPENAI_BASE_URL);
        assert_eq!(openai.model, OPENAI_MODEL);
        assert_eq!(openai.request_timeout, Duration::from_secs(30));
        assert_eq!(openai.api_key.as_ref().unwrap().expose_secret(), "sk-live");
    }

    #[tokio::test]
    async fn missing_required_settings_are_fatal() {
        for missing in [ENV_BOT_TOKEN, ENV_ALLOWED_IDS, ENV_LOCAL_BASE, ENV_LOCAL_MODEL] {
            let vars: Vec<_> = required().into_iter().filter(|(k, _)| *k != missing).collect();
            let err = load_settings_with(None, env_of(&vars)).await.unwrap_err();
            assert!(
                matches!(err, ConfigError::Missing(field) if field == missing),
                "expected Missing({missing}), got {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn blank_allow_list_is_missing() {
        let mut vars = required();
        vars.retain(|(k, _)| *k != ENV_ALLOWED_IDS);
        vars.push((ENV_ALLOWED_IDS, " , ,"));
        let err = load_settings_with(None, env_of(&vars)).await.unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_ALLOWED_IDS)));
    }

    #[tokio::test]
    async fn invalid_values_are_rejected() {
        let cases = [
            (ENV_LOCAL_BASE, "ftp://tunnel.example.com"),
            (ENV_LOCAL_BASE, "not a url"),
            (ENV_LOCAL_TIMEOUT, "0"),
            (ENV_LOCAL_TIMEOUT, "soon"),
            (ENV_PORT, "99999"),
            (ENV_RESTART_EXIT_CODE, "0"),
        ];
        for (key, value) in cases {
            let mut vars = required();
            vars.retain(|(k, _)| *k != key);
            vars.push((key, value));
            let err = load_settings_with(None, env_of(&vars)).await.unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { .. }),
                "{key}={value} should be invalid, got {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn env_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clawdbot.toml");
        tokio::fs::write(
            &path,
            r#"
bot_token = "file-token"
allowed_principals = ["999"]
port = 9000
health_interval_secs = 30

[local]
base_url = "http://192.168.1.20:1234/v1"
model = "file-model"
timeout_secs = 90

[[fallbacks]]
id = "GROQ"
base_url = "https://api.groq.com/openai/v1"
model = "llama-3.1-8b-instant"
api_key_env = "GROQ_API_KEY"
"#,
        )
        .await
        .unwrap();

        let vars = [
            (ENV_LOCAL_MODEL, "env-model"),
            (ENV_PORT, "8081"),
            ("GROQ_API_KEY", "gsk-test"),
        ];
        let settings = load_settings_with(Some(&path), env_of(&vars)).await.unwrap();

        assert_eq!(settings.bot_token.expose_secret(), "file-token");
        assert_eq!(settings.allowed_principals, vec![Principal::from("999")]);
        assert_eq!(settings.port, 8081);
        assert_eq!(settings.health_interval, Duration::from_secs(30));

        let local = &settings.providers[0];
        assert_eq!(local.model, "env-model");
        assert_eq!(local.base_url, "http://192.168.1.20:1234/v1");
        assert_eq!(local.request_timeout, Duration::from_secs(90));

        let groq = &settings.providers[1];
        assert_eq!(groq.id, "GROQ");
        assert_eq!(groq.kind, ProviderKind::Fallback);
        assert_eq!(groq.request_timeout, Duration::from_secs(OPENAI_TIMEOUT_SECS));
        assert_eq!(groq.api_key.as_ref().unwrap().expose_secret(), "gsk-test");
    }

    #[tokio::test]
    async fn fallback_key_env_must_be_set() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clawdbot.toml");
        tokio::fs::write(
            &path,
            r#"
[[fallbacks]]
id = "GROQ"
base_url = "https://api.groq.com/openai/v1"
model = "llama-3.1-8b-instant"
api_key_env = "GROQ_API_KEY"
"#,
        )
        .await
        .unwrap();

        let err = load_settings_with(Some(&path), env_of(&required()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn unreadable_and_malformed_files_are_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("absent.toml");
        let err = load_settings_with(Some(&missing), env_of(&required()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let bad = tmp.path().join("bad.toml");
        tokio::fs::write(&bad, "this is not { valid toml !!!").await.unwrap();
        let err = load_settings_with(Some(&bad), env_of(&required()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn redacted_settings_hide_secrets() {
        let mut vars = required();
        vars.push((ENV_OPENAI_KEY, "sk-live-secret"));
        let settings = load_settings_with(None, env_of(&vars)).await.unwrap();

        let json = serde_json::to_string(&settings.redacted()).unwrap();
        assert!(!json.contains("sk-live-secret"));
        assert!(!json.contains("123:abc"));
        assert!(json.contains("\"api_key_set\":true"));
        assert!(json.contains("tunnel.trycloudflare.com"));
    }
}
