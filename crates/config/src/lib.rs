//! Configuration loading and validation for TreatOrHell.
//!
//! Sources, lowest to highest priority:
//! 1. built-in defaults
//! 2. an optional TOML file named by `TREATORHELL_CONFIG`
//! 3. a `.env` file in the working directory (never overrides real env vars)
//! 4. process environment variables
//!
//! The result is validated once at startup; a missing completion-API key is
//! fatal.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "TREATORHELL_CONFIG";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion API settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Debug mode (forces debug-level logging)
    #[serde(default)]
    pub debug: bool,

    /// Log level name (`INFO`, `DEBUG`, ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Service metadata reported by the API
    #[serde(default)]
    pub api: ApiInfoConfig,

    /// HTTP server settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Answer storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_log_level() -> String {
    "INFO".into()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f32 {
    0.7
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfoConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_description")]
    pub description: String,
}

fn default_title() -> String {
    "TreatOrHell".into()
}
fn default_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
fn default_description() -> String {
    "TreatOrHell – a playful API where celestial beings judge students. \
     Provides chat-style endpoints for 'angel' feedback."
        .into()
}

impl Default for ApiInfoConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            version: default_version(),
            description: default_description(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; `https://*.example.com` matches any subdomain.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "https://treat-or-hell.vercel.app".into(),
        "https://*.vercel.app".into(),
    ]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Where the student answers live.
///
/// Two naming schemes are accepted for the Upstash REST credentials; the
/// `UPSTASH_`-prefixed pair wins per field when both are set.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local file used when no remote credentials are configured
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstash_kv_rest_api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstash_kv_rest_api_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kv_rest_api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kv_rest_api_token: Option<String>,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data").join("student_responses.txt")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            upstash_kv_rest_api_url: None,
            upstash_kv_rest_api_token: None,
            kv_rest_api_url: None,
            kv_rest_api_token: None,
        }
    }
}

impl StorageConfig {
    /// The remote store URL, first present scheme wins.
    pub fn remote_url(&self) -> Option<&str> {
        first_present(&self.upstash_kv_rest_api_url, &self.kv_rest_api_url)
    }

    /// The remote store token, first present scheme wins.
    pub fn remote_token(&self) -> Option<&str> {
        first_present(&self.upstash_kv_rest_api_token, &self.kv_rest_api_token)
    }

    /// Both remote URL and token, when the remote backend should be used.
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        Some((self.remote_url()?, self.remote_token()?))
    }
}

fn first_present<'a>(preferred: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    [preferred, fallback]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|s| !s.trim().is_empty())
}

const REDACTED: &str = "[REDACTED]";

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => REDACTED,
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("openai", &self.openai)
            .field("debug", &self.debug)
            .field("log_level", &self.log_level)
            .field("api", &self.api)
            .field("gateway", &self.gateway)
            .field("storage", &self.storage)
            .finish()
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("path", &self.path)
            .field("upstash_kv_rest_api_url", &self.upstash_kv_rest_api_url)
            .field("upstash_kv_rest_api_token", &redact(&self.upstash_kv_rest_api_token))
            .field("kv_rest_api_url", &self.kv_rest_api_url)
            .field("kv_rest_api_token", &redact(&self.kv_rest_api_token))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`).
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`AppConfig::load`] but skips validation, for tooling that does
    /// not talk to the completion API.
    pub fn load_unvalidated() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
        }
        Self::overlay(|key| std::env::var(key).ok())
    }

    /// Load configuration, reading variables through `lookup`.
    ///
    /// Used by `load()` with the real environment and by tests with a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::overlay(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn overlay<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) if !path.trim().is_empty() => Self::load_from(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env(&lookup)?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file path (no env, no validation).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Overlay environment variables on top of the current values.
    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(model) = var("OPENAI_MODEL") {
            self.openai.model = model;
        }
        if let Some(raw) = var("OPENAI_MAX_TOKENS") {
            self.openai.max_tokens = parse_env("OPENAI_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = var("OPENAI_TEMPERATURE") {
            self.openai.temperature = parse_env("OPENAI_TEMPERATURE", &raw)?;
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(raw) = var("DEBUG") {
            self.debug = parse_bool("DEBUG", &raw)?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(host) = var("HOST") {
            self.gateway.host = host;
        }
        if let Some(raw) = var("PORT") {
            self.gateway.port = parse_env("PORT", &raw)?;
        }
        if let Some(raw) = var("CORS_ORIGINS") {
            self.gateway.cors_origins = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = var("STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }

        let storage = &mut self.storage;
        for (name, slot) in [
            ("UPSTASH_KV_REST_API_URL", &mut storage.upstash_kv_rest_api_url),
            ("UPSTASH_KV_REST_API_TOKEN", &mut storage.upstash_kv_rest_api_token),
            ("KV_REST_API_URL", &mut storage.kv_rest_api_url),
            ("KV_REST_API_TOKEN", &mut storage.kv_rest_api_token),
        ] {
            if let Some(value) = var(name) {
                *slot = Some(value);
            }
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.has_api_key() {
            return Err(ConfigError::ValidationError(
                "OPENAI_API_KEY must be set".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(ConfigError::ValidationError(
                "openai temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.openai.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "openai max_tokens must be greater than 0".into(),
            ));
        }

        if self.openai.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "openai model must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if a completion API key is available.
    pub fn has_api_key(&self) -> bool {
        self.openai
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// The `tracing` filter directive implied by `debug` and `log_level`.
    pub fn log_filter(&self) -> String {
        if self.debug {
            "debug".into()
        } else {
            self.log_level.to_lowercase()
        }
    }

    /// A copy with every secret replaced by a placeholder, safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in [
            &mut copy.openai.api_key,
            &mut copy.storage.upstash_kv_rest_api_token,
            &mut copy.storage.kv_rest_api_token,
        ] {
            if secret.is_some() {
                *secret = Some(REDACTED.into());
            }
        }
        copy
    }

    /// The `host:port` the gateway binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.gateway.host, self.gateway.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            debug: false,
            log_level: default_log_level(),
            api: ApiInfoConfig::default(),
            gateway: GatewayConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

fn parse_env<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: raw.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_with_api_key() {
        let config = AppConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.max_tokens, 1000);
        assert!((config.openai.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.log_filter(), "info");
        assert!(config.storage.remote_credentials().is_none());
    }

    #[test]
    fn missing_api_key_fails_fast() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let blank = AppConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")]));
        assert!(blank.is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_MAX_TOKENS", "256"),
            ("OPENAI_TEMPERATURE", "0.2"),
            ("DEBUG", "true"),
            ("PORT", "9001"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ]))
        .unwrap();
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.openai.max_tokens, 256);
        assert!(config.debug);
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.bind_addr(), "0.0.0.0:9001");
        assert_eq!(config.gateway.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn invalid_numeric_env_names_variable() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_MAX_TOKENS"));
    }

    #[test]
    fn invalid_temperature_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TEMPERATURE", "5.0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn upstash_prefix_wins_per_field() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("UPSTASH_KV_REST_API_URL", "https://upstash.example"),
            ("KV_REST_API_URL", "https://kv.example"),
            ("KV_REST_API_TOKEN", "kv-token"),
        ]))
        .unwrap();
        let (url, token) = config.storage.remote_credentials().unwrap();
        assert_eq!(url, "https://upstash.example");
        assert_eq!(token, "kv-token");
    }

    #[test]
    fn remote_requires_both_url_and_token() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("KV_REST_API_URL", "https://kv.example"),
        ]))
        .unwrap();
        assert!(config.storage.remote_credentials().is_none());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-very-secret"),
            ("KV_REST_API_URL", "https://kv.example"),
            ("KV_REST_API_TOKEN", "kv-very-secret"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("kv-very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn toml_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treatorhell.toml");
        std::fs::write(
            &path,
            r#"
log_level = "WARN"

[openai]
api_key = "sk-from-file"
model = "gpt-4.1-mini"

[gateway]
port = 7000
"#,
        )
        .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = AppConfig::from_lookup(lookup_from(&[
            (CONFIG_PATH_VAR, path_str.as_str()),
            ("PORT", "7100"),
        ]))
        .unwrap();
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-from-file"));
        assert_eq!(config.openai.model, "gpt-4.1-mini");
        assert_eq!(config.log_filter(), "warn");
        assert_eq!(config.gateway.port, 7100);
    }

    #[test]
    fn redacted_copy_hides_tokens() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-secret"),
            ("KV_REST_API_URL", "https://x.upstash.io"),
            ("KV_REST_API_TOKEN", "tok-secret"),
        ]))
        .unwrap();
        let shown = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!shown.contains("sk-secret"));
        assert!(!shown.contains("tok-secret"));
        assert!(shown.contains("https://x.upstash.io"));
        assert!(config.redacted().storage.upstash_kv_rest_api_token.is_none());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/treatorhell.toml")).unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
    }
}
