//! Chat notifications for review results and log records

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::review::AttemptResult;
use crate::Result;

/// Capability to deliver a plain-text message to a chat
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `text` to the chat identified by `chat_id`
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Line used when the reviewer sent the work back
pub const NEGATIVE_RESULT: &str = "Unfortunately, the reviewer found mistakes in your work.";

/// Line used when the work was accepted
pub const POSITIVE_RESULT: &str =
    "The reviewer liked everything, you can move on to the next lesson.";

/// Render the notification text for one attempt
pub fn format_attempt(attempt: &AttemptResult) -> String {
    let verdict = if attempt.is_negative {
        NEGATIVE_RESULT
    } else {
        POSITIVE_RESULT
    };

    format!(
        "Your work \"{}\" has been reviewed.\n{}\nLink to your work:\n{}",
        attempt.lesson_title, verdict, attempt.lesson_url
    )
}

/// Formats review results and log records and sends them to one chat
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn MessageSender>,
    chat_id: String,
}

impl Notifier {
    /// Create a notifier delivering to `chat_id` through `sender`
    pub fn new(sender: Arc<dyn MessageSender>, chat_id: impl Into<String>) -> Self {
        Self {
            sender,
            chat_id: chat_id.into(),
        }
    }

    /// Target chat identifier
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Send one message describing `attempt`
    ///
    /// Delivery errors are returned as-is; nothing is retried here.
    pub async fn notify(&self, attempt: &AttemptResult) -> Result<()> {
        info!(
            chat_id = %self.chat_id,
            lesson = %attempt.lesson_title,
            negative = attempt.is_negative,
            "Sending review notification"
        );
        let text = format_attempt(attempt);
        self.sender.send_message(&self.chat_id, &text).await
    }

    /// Send a rendered log record to the chat
    pub async fn notify_log(&self, text: &str) -> Result<()> {
        debug!(chat_id = %self.chat_id, "Sending log record");
        self.sender.send_message(&self.chat_id, text).await
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSender;
    use super::*;
    use crate::Error;

    fn attempt(is_negative: bool, title: &str, url: &str) -> AttemptResult {
        AttemptResult {
            is_negative,
            lesson_title: title.to_string(),
            lesson_url: url.to_string(),
        }
    }

    #[test]
    fn test_negative_template_keeps_title_and_url() {
        let title = "Отправляем уведомления о проверке работ \"v2\" & <more>";
        let url = "https://dvmn.org/modules/chat-bots/lesson/devman-bot/?a=1&b=%20";
        let text = format_attempt(&attempt(true, title, url));

        assert!(text.contains(NEGATIVE_RESULT));
        assert!(!text.contains(POSITIVE_RESULT));
        assert!(text.contains(title));
        assert!(text.lines().any(|line| line == url));
    }

    #[test]
    fn test_positive_template() {
        let text = format_attempt(&attempt(false, "Async", "http://x/1"));
        assert!(text.contains(POSITIVE_RESULT));
        assert!(!text.contains(NEGATIVE_RESULT));
        assert!(text.contains("\"Async\""));
    }

    #[tokio::test]
    async fn test_notify_sends_to_chat() {
        let sender = Arc::new(RecordingSender::default());
        let notifier = Notifier::new(sender.clone(), "12345");

        notifier
            .notify(&attempt(true, "Async", "http://x/1"))
            .await
            .unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "12345");
        assert!(sent[0].1.contains("Async"));
    }

    #[tokio::test]
    async fn test_notify_log_sends_text_verbatim() {
        let sender = Arc::new(RecordingSender::default());
        let notifier = Notifier::new(sender.clone(), "12345");

        notifier.notify_log("WARN devwatch: disk full").await.unwrap();

        assert_eq!(sender.texts(), vec!["WARN devwatch: disk full".to_string()]);
    }

    #[tokio::test]
    async fn test_notify_propagates_delivery_error() {
        let sender = Arc::new(RecordingSender::failing_after(0));
        let notifier = Notifier::new(sender, "12345");

        let err = notifier
            .notify(&attempt(false, "Async", "http://x/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Delivery(_)));
    }
}
