pub mod kv;

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use serde::{Deserialize, Serialize};

use crate::chain::checksummed;
use crate::error::StoreError;

pub use kv::KvIdentityStore;

/// A user's address and the key it is derived from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypair {
    pub address: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

impl Keypair {
    /// Fresh random secp256k1 key; the address is its EIP-55 form.
    pub fn generate() -> Self {
        let wallet = LocalWallet::new(&mut ethers::core::rand::thread_rng());
        Self {
            address: checksummed(&wallet.address()),
            private_key: format!("0x{}", hex::encode(wallet.signer().to_bytes())),
        }
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Per-user keypair persistence, keyed by the sender's handle.
///
/// Records are never overwritten: `create_if_absent` must be atomic on the
/// backing store so concurrent first writes for one handle keep exactly one.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get(&self, handle: &str) -> Result<Option<Keypair>, StoreError>;

    /// Returns `true` if this call stored the record, `false` if one already existed.
    async fn create_if_absent(&self, handle: &str, keypair: &Keypair) -> Result<bool, StoreError>;
}
