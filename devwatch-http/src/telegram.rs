//! Telegram Bot API message sender

use std::time::Duration;

use async_trait::async_trait;
use devwatch_core::{Error, MessageSender, Result, Settings};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::USER_AGENT;

/// Transport-level bound for a single Bot API call
pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends chat messages through the Telegram Bot API
pub struct TelegramSender {
    http: reqwest::Client,
    api_url: Url,
    bot_token: String,
}

impl TelegramSender {
    /// Create a sender for the bot identified by `bot_token`
    pub fn new(bot_token: impl Into<String>, api_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create Telegram client: {}", e)))?;

        Ok(Self {
            http,
            api_url,
            bot_token: bot_token.into(),
        })
    }

    /// Create a sender from resolved settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.bot_token.clone(), settings.telegram_api_url.clone())
    }

    /// URL of a Bot API method, e.g. `<api>/bot<token>/sendMessage`
    fn method_url(&self, method: &str) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid Telegram API URL: {}", self.api_url)))?
            .pop_if_empty()
            .push(&format!("bot{}", self.bot_token))
            .push(method);
        Ok(url)
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        debug!(chat_id, len = text.len(), "Sending Telegram message");

        let response = self
            .http
            .post(self.method_url("sendMessage")?)
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            // Never echo the request URL: it carries the bot token
            .map_err(|e| Error::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let reply: BotApiResponse = response.json().await.map_err(|e| {
            Error::Delivery(format!(
                "Unreadable Bot API reply ({}): {}",
                status,
                e.without_url()
            ))
        })?;

        if !reply.ok {
            return Err(Error::Delivery(
                reply
                    .description
                    .unwrap_or_else(|| format!("Bot API returned status {}", status)),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSender")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sender_for(server: &MockServer) -> TelegramSender {
        TelegramSender::new("123:abc", Url::parse(&server.uri()).unwrap()).unwrap()
    }

    #[test]
    fn test_method_url() {
        let sender =
            TelegramSender::new("123:abc", Url::parse("https://api.telegram.org").unwrap())
                .unwrap();
        assert_eq!(
            sender.method_url("sendMessage").unwrap().as_str(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_method_url_with_base_path() {
        let sender = TelegramSender::new(
            "123:abc",
            Url::parse("http://proxy.local/telegram/").unwrap(),
        )
        .unwrap();
        assert_eq!(
            sender.method_url("sendMessage").unwrap().as_str(),
            "http://proxy.local/telegram/bot123:abc/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "42",
                "text": "Your work \"Async\" has been reviewed."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"ok":true,"result":{"message_id":1}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        sender_for(&server)
            .send_message("42", "Your work \"Async\" has been reviewed.")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_message_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let err = sender_for(&server).send_message("42", "hi").await.unwrap_err();
        match err {
            Error::Delivery(message) => assert!(message.contains("chat not found")),
            other => panic!("expected delivery error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_message_unreadable_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = sender_for(&server).send_message("42", "hi").await.unwrap_err();
        match err {
            Error::Delivery(message) => {
                assert!(message.contains("502"));
                assert!(!message.contains("123:abc"));
            }
            other => panic!("expected delivery error, got {:?}", other),
        }
    }
}
