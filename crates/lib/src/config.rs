//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.hinode/config.json`) and environment.
//! LINE credentials resolve env-first so the file can stay free of secrets.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// LINE Messaging API settings (credentials, reply endpoint).
    #[serde(default)]
    pub line: LineConfig,

    /// Sunrise/sunset lookup settings.
    #[serde(default)]
    pub suntimes: SunTimesConfig,
}

/// Webhook bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Port for the webhook HTTP server (default 15161).
    #[serde(default = "default_webhook_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1"). LINE must reach the webhook through
    /// a TLS-terminating proxy or tunnel when bound to loopback.
    #[serde(default = "default_webhook_bind")]
    pub bind: String,
}

fn default_webhook_port() -> u16 {
    15161
}

fn default_webhook_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            port: default_webhook_port(),
            bind: default_webhook_bind(),
        }
    }
}

/// LINE channel credentials and reply endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Channel secret used for webhook signature verification. Overridden by LINE_CHANNEL_SECRET env.
    pub channel_secret: Option<String>,

    /// Channel access token for the reply API. Overridden by LINE_CHANNEL_ACCESS_TOKEN env.
    pub channel_access_token: Option<String>,

    /// Reply API base URL (default `https://api.line.me`).
    pub api_base: Option<String>,
}

/// Sunrise/sunset API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunTimesConfig {
    /// Lookup API base URL (default `https://api.sunrise-sunset.org`).
    pub api_base: Option<String>,
}

/// Resolved LINE credentials, validated once at startup and passed into the server.
#[derive(Clone)]
pub struct Credentials {
    pub channel_secret: String,
    pub channel_access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("channel_secret", &"[redacted]")
            .field("channel_access_token", &"[redacted]")
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from environment (preferred) and config.
    /// Fails when either is missing: the webhook can neither verify nor reply without them.
    pub fn resolve(config: &Config) -> Result<Self> {
        Self::from_values(
            std::env::var("LINE_CHANNEL_SECRET").ok(),
            std::env::var("LINE_CHANNEL_ACCESS_TOKEN").ok(),
            config,
        )
    }

    fn from_values(
        env_secret: Option<String>,
        env_token: Option<String>,
        config: &Config,
    ) -> Result<Self> {
        let channel_secret = first_non_empty(env_secret, config.line.channel_secret.clone())
            .context("LINE_CHANNEL_SECRET is not set and line.channelSecret is absent from config")?;
        let channel_access_token =
            first_non_empty(env_token, config.line.channel_access_token.clone()).context(
                "LINE_CHANNEL_ACCESS_TOKEN is not set and line.channelAccessToken is absent from config",
            )?;
        Ok(Self {
            channel_secret,
            channel_access_token,
        })
    }
}

/// First non-empty (after trim) of the env value and the config value.
fn first_non_empty(env_value: Option<String>, file_value: Option<String>) -> Option<String> {
    env_value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            file_value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("HINODE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".hinode").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or HINODE_CONFIG_PATH). Missing file => default config
/// (credentials must then come from environment).
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
