use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError as RpcError};
use ethers::types::Address;
use tracing::debug;

use super::{BalanceProvider, BalanceResult};
use crate::error::ProviderError;

/// JSON-RPC backed provider for balances and ENS lookups.
pub struct EthersBalanceProvider {
    provider: Provider<Http>,
    timeout: Duration,
}

impl EthersBalanceProvider {
    pub fn new(rpc_url: &str, ens_registry: Option<Address>, timeout: Duration) -> Result<Self> {
        let mut provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;
        if let Some(registry) = ens_registry {
            provider = provider.ens(registry);
        }
        Ok(Self { provider, timeout })
    }

    async fn bounded<T, F>(&self, call: &str, fut: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, RpcError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| ProviderError(format!("{}: {}", call, e))),
            Err(_) => Err(ProviderError(format!(
                "{} timed out after {}s",
                call,
                self.timeout.as_secs()
            ))),
        }
    }
}

/// Lowercase, trimmed form used for lookups.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait]
impl BalanceProvider for EthersBalanceProvider {
    async fn get_balance(&self, address: Address) -> Result<BalanceResult, ProviderError> {
        debug!("eth_getBalance for {:?}", address);
        let wei = self
            .bounded("eth_getBalance", self.provider.get_balance(address, None))
            .await?;
        Ok(BalanceResult::from_wei(wei))
    }

    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ProviderError> {
        let name = normalize_name(name);
        debug!("Resolving ENS name {}", name);
        let lookup = async {
            match self.provider.resolve_name(&name).await {
                Ok(address) if address.is_zero() => Ok(None),
                Ok(address) => Ok(Some(address)),
                // No resolver, or a resolver without an address record.
                Err(RpcError::EnsError(_)) | Err(RpcError::EnsNotOwned(_)) => Ok(None),
                Err(e) => Err(e),
            }
        };
        self.bounded("ens_resolve", lookup).await
    }
}
