pub mod telegram;

use async_trait::async_trait;

use crate::error::NotifyError;

/// A command-bearing message lifted out of an inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCommand {
    /// Platform-specific chat/channel ID
    pub chat_id: i64,
    /// Sender handle; absent for unattributed channel posts
    pub user_handle: Option<String>,
    /// The raw message text
    pub text: String,
}

/// Delivers reply text to the originating chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), NotifyError>;
}
