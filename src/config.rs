use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub kv: KvConfig,
    /// Filled from the environment, never from the file.
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default = "default_bot_username")]
    pub bot_username: String,
    /// Public URL registered with Telegram at startup, if set.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value.
    #[serde(default)]
    pub secret_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub ens_registry: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KvConfig {
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[derive(Clone, Default)]
pub struct Secrets {
    pub telegram_api_key: String,
    pub rpc_url: String,
    pub kv_rest_api_url: String,
    pub kv_rest_api_token: String,
}

// Hand-written so tokens never end up in logs through `{:?}`.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("rpc_url", &self.rpc_url)
            .field("kv_rest_api_url", &self.kv_rest_api_url)
            .finish_non_exhaustive()
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_webhook_path() -> String {
    "/api/webhook".to_string()
}

fn default_bot_username() -> String {
    "DCFruitBot".to_string()
}

fn default_currency_symbol() -> String {
    "xDAI".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_key_prefix() -> String {
    "user:".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            webhook_path: default_webhook_path(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_username: default_bot_username(),
            webhook_url: None,
            secret_token: None,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            ens_registry: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
        }
    }
}

impl Secrets {
    /// Collect the required secrets through `lookup`, reporting every missing
    /// variable at once. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |names: &[&'static str]| -> String {
            let found = names
                .iter()
                .filter_map(|name| lookup(*name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty());
            match found {
                Some(value) => value,
                None => {
                    missing.push(names[0]);
                    String::new()
                }
            }
        };

        let secrets = Secrets {
            telegram_api_key: required(&["TELEGRAM_API_KEY"]),
            rpc_url: required(&["RPC_URL", "GNOSIS_URL"]),
            kv_rest_api_url: required(&["KV_REST_API_URL"]),
            kv_rest_api_token: required(&["KV_REST_API_TOKEN"]),
        };

        if !missing.is_empty() {
            bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }
        Ok(secrets)
    }
}

impl Config {
    /// Timeout applied to every outbound RPC and Telegram call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.request_timeout_secs.max(1))
    }

    /// The `@handle` form of the bot username, as it appears in message text.
    pub fn bot_mention(&self) -> String {
        format!("@{}", self.telegram.bot_username.trim_start_matches('@'))
    }

    /// Parse non-secret settings from TOML; an empty document yields defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.server.webhook_path.starts_with('/') {
            bail!(
                "server.webhook_path must start with '/', got {:?}",
                self.server.webhook_path
            );
        }
        Ok(())
    }

    /// Load settings from `path` (optional) and secrets from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)?
        } else {
            Self::from_toml("")?
        };

        config.secrets = Secrets::from_lookup(|name| std::env::var(name).ok())?;
        Ok(config)
    }
}
