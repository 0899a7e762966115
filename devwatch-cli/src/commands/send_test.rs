//! Send-test command - check the bot token and chat id

use anyhow::Context;
use clap::Args;
use devwatch_core::{Config, MessageSender, Secrets};
use devwatch_http::TelegramSender;
use url::Url;

/// Arguments for the send-test command
#[derive(Args, Debug)]
pub struct SendTestArgs {
    /// Message text
    #[arg(default_value = "devwatch is connected to this chat")]
    pub text: String,
}

impl SendTestArgs {
    /// Execute the send-test command
    pub async fn execute(&self, config: &Config, secrets: &Secrets) -> anyhow::Result<()> {
        let bot_token = secrets
            .bot_token()
            .context("Telegram bot token not found. Set TGBOT_TOKEN or add it to the secrets file")?;
        let chat_id = config
            .telegram
            .chat_id
            .as_deref()
            .context("Telegram chat id not set. Set TG_CHAT_ID or pass --chat-id")?;

        let api_url = Url::parse(&config.telegram.api_url).context("Invalid telegram.api_url")?;
        let sender = TelegramSender::new(bot_token, api_url)?;

        sender.send_message(chat_id, &self.text).await?;

        println!("Message sent to chat {}", chat_id);
        Ok(())
    }
}
