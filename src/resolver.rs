use ethers::types::Address;
use tracing::debug;

use crate::chain::{parse_address, BalanceProvider};
use crate::error::ResolutionError;

/// Turns user-supplied text into an account address.
pub struct AddressResolver<'a> {
    provider: &'a dyn BalanceProvider,
}

impl<'a> AddressResolver<'a> {
    pub fn new(provider: &'a dyn BalanceProvider) -> Self {
        Self { provider }
    }

    /// A well-formed address comes back as-is without touching the network;
    /// anything else is looked up as a name.
    pub async fn resolve(&self, input: &str) -> Result<Address, ResolutionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ResolutionError::EmptyInput);
        }

        if let Some(address) = parse_address(input) {
            return Ok(address);
        }

        debug!("'{}' is not an address, trying name lookup", input);
        match self.provider.resolve_name(input).await? {
            Some(address) => Ok(address),
            None => Err(ResolutionError::NameNotFound(input.to_string())),
        }
    }

    /// Strict variant: only literal addresses, no name lookup.
    pub fn resolve_literal(&self, input: &str) -> Result<Address, ResolutionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ResolutionError::EmptyInput);
        }
        parse_address(input).ok_or_else(|| ResolutionError::InvalidAddress(input.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::testing::MockProvider;

    const ADDR: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[tokio::test]
    async fn test_valid_address_is_identity_without_network() {
        let provider = MockProvider::default();
        let resolver = AddressResolver::new(&provider);

        for input in [ADDR.to_string(), ADDR.to_lowercase()] {
            let resolved = resolver.resolve(&input).await.unwrap();
            assert_eq!(resolved, parse_address(&input).unwrap());
        }
        assert_eq!(provider.name_lookups(), 0);
        assert_eq!(provider.balance_queries(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_fails_before_network() {
        let provider = MockProvider::default();
        let resolver = AddressResolver::new(&provider);

        for input in ["", "   ", "\t\n"] {
            assert_eq!(
                resolver.resolve(input).await,
                Err(ResolutionError::EmptyInput)
            );
        }
        assert_eq!(provider.name_lookups(), 0);
    }

    #[tokio::test]
    async fn test_name_lookup_hit() {
        let target = parse_address(ADDR).unwrap();
        let provider = MockProvider::default().with_name("vitalik.eth", target);
        let resolver = AddressResolver::new(&provider);

        assert_eq!(resolver.resolve("vitalik.eth").await, Ok(target));
        assert_eq!(provider.name_lookups(), 1);
    }

    #[tokio::test]
    async fn test_name_lookup_miss() {
        let provider = MockProvider::default();
        let resolver = AddressResolver::new(&provider);

        assert_eq!(
            resolver.resolve("nobody.eth").await,
            Err(ResolutionError::NameNotFound("nobody.eth".into()))
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_distinct_from_miss() {
        let provider = MockProvider::default().failing("node unreachable");
        let resolver = AddressResolver::new(&provider);

        assert_eq!(
            resolver.resolve("vitalik.eth").await,
            Err(ResolutionError::ProviderError(ProviderError(
                "node unreachable".into()
            )))
        );
    }

    #[test]
    fn test_literal_rejects_names() {
        let provider = MockProvider::default();
        let resolver = AddressResolver::new(&provider);

        assert!(resolver.resolve_literal(ADDR).is_ok());
        assert_eq!(
            resolver.resolve_literal("vitalik.eth"),
            Err(ResolutionError::InvalidAddress("vitalik.eth".into()))
        );
        assert_eq!(resolver.resolve_literal(" "), Err(ResolutionError::EmptyInput));
    }
}
