//! Telegram Bot API channel

use super::Notifier;
use crate::config::TelegramConfig;
use crate::error::{BotError, Result};
use crate::types::DeliveryId;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    http: Client,
    bot_token: String,
    chat_id: String,
    disable_preview: bool,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct EditMessageRequest<'a> {
    chat_id: &'a str,
    message_id: DeliveryId,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct DeleteMessageRequest<'a> {
    chat_id: &'a str,
    message_id: DeliveryId,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: DeliveryId,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            disable_preview: config.disable_preview,
        })
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/bot{}/{}", API_BASE, self.bot_token, method);
        let response: ApiResponse<T> = self.http.post(&url).json(body).send().await?.json().await?;

        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(BotError::Notify(format!(
                "{} failed: {}",
                method,
                description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, text: &str) -> Result<DeliveryId> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: self.disable_preview,
        };
        let sent: SentMessage = self.call("sendMessage", &request).await?;
        debug!("Telegram message {} sent", sent.message_id);
        Ok(sent.message_id)
    }

    async fn edit(&self, id: DeliveryId, text: &str) -> Result<()> {
        let request = EditMessageRequest {
            chat_id: &self.chat_id,
            message_id: id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: self.disable_preview,
        };
        // Result is the edited message, or `true` for inline messages
        let _: serde_json::Value = self.call("editMessageText", &request).await?;
        Ok(())
    }

    async fn delete(&self, id: DeliveryId) -> Result<()> {
        let request = DeleteMessageRequest {
            chat_id: &self.chat_id,
            message_id: id,
        };
        let _: bool = self.call("deleteMessage", &request).await?;
        Ok(())
    }
}
