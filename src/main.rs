mod chain;
mod command;
mod config;
mod dispatcher;
mod error;
mod identity;
mod platform;
mod resolver;
mod server;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::chain::{parse_address, EthersBalanceProvider};
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::identity::KvIdentityStore;
use crate::platform::telegram::TelegramNotifier;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,walletbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Bot: {}", config.bot_mention());
    info!("  Currency: {}", config.chain.currency_symbol);
    info!("  Webhook path: {}", config.server.webhook_path);

    let timeout = config.request_timeout();

    let ens_registry = match &config.chain.ens_registry {
        Some(raw) => Some(
            parse_address(raw).with_context(|| format!("Invalid ens_registry address: {}", raw))?,
        ),
        None => None,
    };
    let provider = EthersBalanceProvider::new(&config.secrets.rpc_url, ens_registry, timeout)?;

    let store = KvIdentityStore::new(
        &config.secrets.kv_rest_api_url,
        &config.secrets.kv_rest_api_token,
        &config.kv.key_prefix,
        timeout,
    )?;

    let notifier = TelegramNotifier::new(Bot::new(&config.secrets.telegram_api_key), timeout);
    if let Some(url) = &config.telegram.webhook_url {
        notifier
            .register_webhook(url, config.telegram.secret_token.as_deref())
            .await?;
    }

    let dispatcher = Dispatcher::new(
        Arc::new(provider),
        Arc::new(store),
        Arc::new(notifier),
        config.bot_mention(),
        config.chain.currency_symbol.clone(),
    );

    let state = AppState {
        dispatcher: Arc::new(dispatcher),
        bot_mention: config.bot_mention(),
        secret_token: config.telegram.secret_token.clone(),
    };
    let app = server::router(state, &config.server.webhook_path);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;

    info!("Listening on {}", config.server.bind_address);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
