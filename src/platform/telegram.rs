use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::info;

use super::{IncomingCommand, Notifier};
use crate::error::NotifyError;

/// The subset of a Telegram `Update` the webhook looks at.
#[derive(Debug, Deserialize, Default)]
pub struct WebhookUpdate {
    #[serde(default)]
    pub message: Option<UpdateMessage>,
    #[serde(default)]
    pub channel_post: Option<UpdateMessage>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessage {
    pub chat: UpdateChat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    #[serde(default)]
    pub from: Option<UpdateUser>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
}

impl UpdateMessage {
    fn first_entity_is(&self, kind: &str) -> bool {
        self.entities.first().is_some_and(|e| e.kind == kind)
    }
}

/// Decide whether an update is addressed to the bot.
///
/// Direct messages count when the first entity is a `bot_command`. Channel
/// posts also count when the first entity is a `mention` and the text names
/// the bot. Channel posts carry no sender handle.
pub fn extract_command(update: &WebhookUpdate, bot_mention: &str) -> Option<IncomingCommand> {
    if let Some(msg) = &update.message {
        let text = msg.text.as_deref()?;
        if !msg.first_entity_is("bot_command") {
            return None;
        }
        let user_handle = msg
            .from
            .as_ref()
            .and_then(|u| u.username.clone())
            .filter(|name| !name.is_empty());
        return Some(IncomingCommand {
            chat_id: msg.chat.id,
            user_handle,
            text: text.to_string(),
        });
    }

    if let Some(post) = &update.channel_post {
        let text = post.text.as_deref()?;
        let addressed = post.first_entity_is("bot_command")
            || (post.first_entity_is("mention") && text.contains(bot_mention));
        if !addressed {
            return None;
        }
        return Some(IncomingCommand {
            chat_id: post.chat.id,
            user_handle: None,
            text: text.to_string(),
        });
    }

    None
}

/// Sends Markdown replies through the Bot API.
pub struct TelegramNotifier {
    bot: Bot,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }

    /// Point Telegram at our webhook endpoint.
    pub async fn register_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        let url = reqwest::Url::parse(url).with_context(|| format!("Invalid webhook URL: {}", url))?;
        let mut request = self.bot.set_webhook(url.clone());
        if let Some(secret) = secret_token {
            request = request.secret_token(secret.to_string());
        }
        request.await.context("Failed to register Telegram webhook")?;
        info!("Telegram webhook registered at {}", url);
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        #[allow(deprecated)]
        let send = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Markdown);

        match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result.map(|_| ()).map_err(NotifyError::from),
            Err(_) => Err(NotifyError::Timeout),
        }
    }
}
