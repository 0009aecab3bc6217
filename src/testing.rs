//! In-process doubles for the three remote collaborators. Each counts calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, U256};

use crate::chain::{BalanceProvider, BalanceResult};
use crate::error::{NotifyError, ProviderError, StoreError};
use crate::identity::{IdentityStore, Keypair};
use crate::platform::Notifier;

#[derive(Default)]
pub struct MockProvider {
    names: HashMap<String, Address>,
    balances: HashMap<Address, U256>,
    failure: Option<String>,
    lookups: AtomicUsize,
    queries: AtomicUsize,
}

impl MockProvider {
    pub fn with_name(mut self, name: &str, address: Address) -> Self {
        self.names.insert(name.to_string(), address);
        self
    }

    pub fn with_balance(mut self, address: Address, wei: U256) -> Self {
        self.balances.insert(address, wei);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn name_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn balance_queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceProvider for MockProvider {
    async fn get_balance(&self, address: Address) -> Result<BalanceResult, ProviderError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(ProviderError(message.clone()));
        }
        let wei = self.balances.get(&address).copied().unwrap_or_default();
        Ok(BalanceResult::from_wei(wei))
    }

    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ProviderError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(ProviderError(message.clone()));
        }
        Ok(self.names.get(name).copied())
    }
}

/// Map-backed store whose conditional create is atomic under its lock.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    records: Mutex<HashMap<String, Keypair>>,
    fail: bool,
    /// Delay before writing, to let concurrent callers interleave.
    write_delay: Option<Duration>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryIdentityStore {
    pub fn with_record(self, handle: &str, keypair: Keypair) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(handle.to_string(), keypair);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Conditional-create calls, whether or not they stored anything.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn record(&self, handle: &str) -> Option<Keypair> {
        self.records.lock().unwrap().get(handle).cloned()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get(&self, handle: &str) -> Result<Option<Keypair>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Remote("store offline".into()));
        }
        Ok(self.record(handle))
    }

    async fn create_if_absent(&self, handle: &str, keypair: &Keypair) -> Result<bool, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Remote("store offline".into()));
        }
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        let mut records = self.records.lock().unwrap();
        if records.contains_key(handle) {
            return Ok(false);
        }
        records.insert(handle.to_string(), keypair.clone());
        Ok(true)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        if self.fail {
            return Err(NotifyError::Timeout);
        }
        Ok(())
    }
}

/// Base URL of a local server that accepts connections and never answers.
pub async fn stalled_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{}", addr)
}
