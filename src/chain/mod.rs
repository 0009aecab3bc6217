pub mod address;
pub mod provider;

use async_trait::async_trait;
use ethers::types::{Address, U256};
use serde::Serialize;

use crate::error::ProviderError;

pub use address::{checksummed, parse_address};
pub use provider::EthersBalanceProvider;

const ETHER_DECIMALS: usize = 18;

/// Native-currency balance of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceResult {
    /// Smallest unit, serialised as a decimal string so no precision is lost.
    #[serde(rename = "balanceWei", serialize_with = "serialize_decimal")]
    pub wei: U256,
    /// Human-scaled amount.
    #[serde(rename = "balanceEth")]
    pub ether: String,
}

impl BalanceResult {
    pub fn from_wei(wei: U256) -> Self {
        Self {
            ether: format_ether(wei),
            wei,
        }
    }
}

fn serialize_decimal<S: serde::Serializer>(value: &U256, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
}

/// Exact fixed-point rendering of a wei amount, trailing zeros trimmed.
pub fn format_ether(wei: U256) -> String {
    let digits = wei.to_string();
    let (int_part, frac_part) = if digits.len() > ETHER_DECIMALS {
        let split = digits.len() - ETHER_DECIMALS;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        (
            "0".to_string(),
            format!("{:0>width$}", digits, width = ETHER_DECIMALS),
        )
    };

    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        int_part
    } else {
        format!("{}.{}", int_part, frac)
    }
}

/// Remote blockchain collaborator: balances and name lookups.
///
/// Both calls are single attempts; callers surface a failure as-is.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<BalanceResult, ProviderError>;

    /// `Ok(None)` when the name has no address record.
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_whole_and_fractional() {
        assert_eq!(format_ether(U256::zero()), "0");
        assert_eq!(format_ether(U256::exp10(18)), "1");
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u64)), "1.5");
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
        assert_eq!(format_ether(U256::exp10(17) * U256::from(3u64)), "0.3");
    }

    #[test]
    fn test_format_is_exact_above_float_precision() {
        // 2^53 wei
        let wei = U256::from(9_007_199_254_740_992u64);
        assert_eq!(format_ether(wei), "0.009007199254740992");

        let huge = U256::from_dec_str("123456789012345678901234567890").unwrap();
        assert_eq!(format_ether(huge), "123456789012.34567890123456789");
    }

    #[test]
    fn test_balance_result_serialises_wei_as_string() {
        let result = BalanceResult::from_wei(U256::from(9_007_199_254_740_993u64));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["balanceWei"], "9007199254740993");
        assert_eq!(json["balanceEth"], "0.009007199254740993");
    }
}
