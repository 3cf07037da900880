//! Configuration for the shopsync storefront app.
//!
//! TOML file + environment overrides, credential resolution (env var,
//! device keyring, plaintext), and translation to
//! `shopsync_core::StorefrontConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopsync_api::{
    AUTH_TOKEN_KEY, KEYRING_SERVICE, KeyringTokenProvider, StaticTokenProvider, TokenSource,
    TransportConfig,
};
use shopsync_core::{QueryConfig, RefreshMode, StorefrontConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiSettings {
    /// Backend base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Override the default `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CacheSettings {
    /// How long a top-sellers entry counts as fresh, in seconds.
    #[serde(default = "default_cache_secs")]
    pub fresh_secs: u64,

    /// How long an unused entry is retained, in seconds.
    #[serde(default = "default_cache_secs")]
    pub gc_grace_secs: u64,

    /// Serve stale entries while refreshing in the background.
    #[serde(default = "default_true")]
    pub stale_while_revalidate: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            fresh_secs: default_cache_secs(),
            gc_grace_secs: default_cache_secs(),
            stale_while_revalidate: true,
        }
    }
}

fn default_cache_secs() -> u64 {
    300
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AuthSettings {
    /// Bearer token in plaintext (prefer the keyring or an env var).
    pub token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "shopsync", "shopsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("shopsync");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the full Config from the canonical file path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path (tests, alternate locations).
///
/// Merge order: built-in defaults, then the TOML file, then
/// `SHOPSYNC_`-prefixed environment variables (`__` separates sections,
/// e.g. `SHOPSYNC_API__TIMEOUT_SECS`). Later sources win.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SHOPSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the credential source for this run.
///
/// Chain: env var → device keyring → plaintext in config → anonymous.
/// Unlike the request-time providers this never fails — an empty chain
/// just means unauthenticated browsing.
pub fn resolve_token_source(config: &Config) -> TokenSource {
    if let Some(ref env_name) = config.auth.token_env {
        if let Ok(token) = std::env::var(env_name) {
            return TokenSource::Static(StaticTokenProvider::new(SecretString::from(token)));
        }
    }

    // Probe once at startup; the provider re-reads per request so token
    // rotation is picked up without re-resolving.
    if keyring_has_token() {
        return TokenSource::Keyring(KeyringTokenProvider::default());
    }

    if let Some(ref token) = config.auth.token {
        return TokenSource::Static(StaticTokenProvider::new(SecretString::from(token.clone())));
    }

    TokenSource::Anonymous
}

fn keyring_has_token() -> bool {
    keyring::Entry::new(KEYRING_SERVICE, AUTH_TOKEN_KEY)
        .and_then(|entry| entry.get_password())
        .is_ok()
}

/// Persist a bearer token in the device keyring.
pub fn store_token(token: &str) -> Result<(), keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, AUTH_TOKEN_KEY)?.set_password(token)
}

/// Remove the stored bearer token, if any.
pub fn clear_token() -> Result<(), keyring::Error> {
    match keyring::Entry::new(KEYRING_SERVICE, AUTH_TOKEN_KEY)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e),
    }
}

// ── Translation to runtime config ───────────────────────────────────

/// Build a `StorefrontConfig` from the loaded settings.
pub fn storefront_config(config: &Config) -> Result<StorefrontConfig, ConfigError> {
    let _: url::Url = config
        .api
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api.base_url".into(),
            reason: format!("invalid URL: {}", config.api.base_url),
        })?;

    let mut transport = TransportConfig {
        timeout: Duration::from_secs(config.api.timeout_secs),
        ..TransportConfig::default()
    };
    if let Some(ref ua) = config.api.user_agent {
        transport.user_agent = ua.clone();
    }

    let refresh = if config.cache.stale_while_revalidate {
        RefreshMode::StaleWhileRevalidate
    } else {
        RefreshMode::Block
    };

    Ok(StorefrontConfig {
        base_url: config.api.base_url.clone(),
        transport,
        top_sellers: QueryConfig {
            fresh_for: Duration::from_secs(config.cache.fresh_secs),
            gc_grace: Duration::from_secs(config.cache.gc_grace_secs),
            refresh,
        },
    })
}
