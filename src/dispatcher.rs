use std::sync::Arc;

use ethers::types::Address;
use tracing::{debug, error, info, warn};

use crate::chain::{checksummed, parse_address, BalanceProvider, BalanceResult};
use crate::command::Command;
use crate::error::{CommandError, StoreError};
use crate::identity::{IdentityStore, Keypair};
use crate::platform::Notifier;
use crate::resolver::AddressResolver;

/// Outcome of one dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Balance {
        address: Address,
        balance: BalanceResult,
    },
    Generated {
        address: String,
    },
    Failed(CommandError),
    /// Nothing to do and nothing sent.
    Ignored,
}

/// Routes parsed commands to their handlers and sends the single reply.
pub struct Dispatcher {
    provider: Arc<dyn BalanceProvider>,
    store: Arc<dyn IdentityStore>,
    notifier: Arc<dyn Notifier>,
    bot_mention: String,
    currency_symbol: String,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn BalanceProvider>,
        store: Arc<dyn IdentityStore>,
        notifier: Arc<dyn Notifier>,
        bot_mention: impl Into<String>,
        currency_symbol: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            notifier,
            bot_mention: bot_mention.into(),
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Handle one message. Never fails: every error becomes a `Reply::Failed`
    /// whose text has already been sent to the chat.
    pub async fn dispatch(&self, chat_id: i64, raw_text: &str, user_handle: Option<&str>) -> Reply {
        let user_handle = user_handle.filter(|h| !h.is_empty());
        let command = Command::parse(raw_text, &self.bot_mention);
        debug!("Parsed {:?} from chat {}", command, chat_id);

        let reply = match command {
            Command::BalanceByAddress(arg) => self.balance(arg, user_handle, true).await,
            Command::Balance(arg) => self.balance(arg, user_handle, false).await,
            Command::Generate => match user_handle {
                Some(handle) => self.generate(handle).await,
                None => {
                    info!("generate from chat {} without a sender handle, ignoring", chat_id);
                    Reply::Ignored
                }
            },
            Command::Unknown => Reply::Failed(CommandError::UnknownCommand),
        };

        self.notify(chat_id, &reply).await;
        reply
    }

    async fn balance(&self, arg: Option<String>, handle: Option<&str>, literal_only: bool) -> Reply {
        match self.lookup_balance(arg, handle, literal_only).await {
            Ok((address, balance)) => {
                info!("Balance of {:?}: {} wei", address, balance.wei);
                Reply::Balance { address, balance }
            }
            Err(e) => {
                warn!("Balance command failed: {}", e);
                Reply::Failed(e)
            }
        }
    }

    async fn lookup_balance(
        &self,
        arg: Option<String>,
        handle: Option<&str>,
        literal_only: bool,
    ) -> Result<(Address, BalanceResult), CommandError> {
        let resolver = AddressResolver::new(self.provider.as_ref());
        let address = match arg {
            Some(input) if literal_only => resolver.resolve_literal(&input)?,
            Some(input) => resolver.resolve(&input).await?,
            None => self.stored_address(handle).await?,
        };
        let balance = self.provider.get_balance(address).await?;
        Ok((address, balance))
    }

    async fn stored_address(&self, handle: Option<&str>) -> Result<Address, CommandError> {
        let Some(handle) = handle else {
            return Err(CommandError::NoAddress);
        };
        let keypair = self
            .store
            .get(handle)
            .await?
            .ok_or(CommandError::NoAddress)?;
        parse_address(&keypair.address).ok_or(CommandError::InvalidInput(keypair.address))
    }

    async fn generate(&self, handle: &str) -> Reply {
        match self.ensure_keypair(handle).await {
            Ok(address) => Reply::Generated { address },
            Err(e) => {
                error!("Key pair for {} unavailable: {}", handle, e);
                Reply::Failed(e.into())
            }
        }
    }

    /// Return the handle's address, creating and storing a key pair first if
    /// none exists. A record, once stored, is never replaced.
    async fn ensure_keypair(&self, handle: &str) -> Result<String, StoreError> {
        if let Some(existing) = self.store.get(handle).await? {
            return Ok(existing.address);
        }

        let keypair = Keypair::generate();
        if self.store.create_if_absent(handle, &keypair).await? {
            info!("Generated key pair for {}: {}", handle, keypair.address);
            return Ok(keypair.address);
        }

        // Another delivery stored first; report its address.
        debug!("Concurrent generate for {}, using stored record", handle);
        self.store
            .get(handle)
            .await?
            .map(|winner| winner.address)
            .ok_or_else(|| StoreError::Remote("record missing after conditional create".into()))
    }

    /// Markdown text for a reply; `None` for replies that send nothing.
    pub fn render(&self, reply: &Reply) -> Option<String> {
        match reply {
            Reply::Balance { address, balance } => Some(format!(
                "✅ The balance for address: *\"{}\"* is {} {}\nHave a great day! 👋🏻",
                checksummed(address),
                balance.ether,
                self.currency_symbol
            )),
            Reply::Generated { address } => Some(format!(
                "✅ Key pair generated successfully:\n- Address: {}",
                address
            )),
            Reply::Failed(e) => Some(e.user_message().to_string()),
            Reply::Ignored => None,
        }
    }

    async fn notify(&self, chat_id: i64, reply: &Reply) {
        let Some(text) = self.render(reply) else {
            return;
        };
        if let Err(e) = self.notifier.reply(chat_id, &text).await {
            error!("Failed to send reply to chat {}: {}", chat_id, e);
        }
    }
}
