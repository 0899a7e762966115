//! Watch command - relay review results to Telegram until interrupted

use std::sync::Arc;

use clap::Args;
use devwatch_core::{Cursor, LogQueue, Notifier, ResultPoller, Settings};
use devwatch_http::{DevmanClient, TelegramSender};

/// Arguments for the watch command
#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    /// Unix timestamp to start polling from (defaults to now)
    #[arg(long)]
    pub since: Option<f64>,
}

impl WatchArgs {
    /// Execute the watch command
    pub async fn execute(&self, settings: &Settings, log_queue: LogQueue) -> anyhow::Result<()> {
        let source = DevmanClient::from_settings(settings)?;
        let sender = Arc::new(TelegramSender::from_settings(settings)?);
        let notifier = Notifier::new(sender, settings.chat_id.clone());

        let mut poller = ResultPoller::new(source, notifier, settings.retry)
            .with_request_timeout(settings.request_timeout)
            .with_log_queue(log_queue);

        if let Some(since) = self.since {
            poller = poller.with_cursor(Cursor::new(since));
        }

        tracing::info!(
            chat_id = %settings.chat_id,
            request_timeout = ?settings.request_timeout,
            "Watching for review results"
        );

        tokio::select! {
            _ = poller.run() => {}
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Interrupted, stopping");
            }
        }

        Ok(())
    }
}
