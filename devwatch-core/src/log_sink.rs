//! Tracing layer that forwards warnings and errors to the chat
//!
//! The layer only renders and enqueues records; the poll loop drains the
//! queue between requests so chat sends never overlap a poll call.

use std::fmt::{self, Write as _};

use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Target used for the sink's own diagnostics; never forwarded to the chat
pub const SINK_TARGET: &str = "devwatch::chat_log";

/// Prefix shared by the targets of all devwatch crates
///
/// Covers `devwatch_core`, `devwatch_http` and the `devwatch` binary. Records
/// from dependencies such as hyper or reqwest stay out of the chat.
pub const APP_TARGET_PREFIX: &str = "devwatch";

fn is_forwarded(target: &str) -> bool {
    target.starts_with(APP_TARGET_PREFIX) && !target.starts_with(SINK_TARGET)
}

/// Create a connected layer and queue
pub fn chat_log_channel() -> (ChatLogLayer, LogQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChatLogLayer { tx }, LogQueue { rx })
}

/// Layer that renders WARN and ERROR events into chat messages
#[derive(Debug, Clone)]
pub struct ChatLogLayer {
    tx: mpsc::UnboundedSender<String>,
}

impl<S: Subscriber> Layer<S> for ChatLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > Level::WARN || !is_forwarded(metadata.target()) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        // Receiver gone means nobody forwards anymore
        let _ = self
            .tx
            .send(visitor.render(metadata.level(), metadata.target()));
    }
}

/// Receiving side of the chat log channel
#[derive(Debug)]
pub struct LogQueue {
    rx: mpsc::UnboundedReceiver<String>,
}

impl LogQueue {
    /// Take every record queued so far without waiting
    pub fn drain(&mut self) -> Vec<String> {
        let mut records = Vec::new();
        while let Ok(record) = self.rx.try_recv() {
            records.push(record);
        }
        records
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: String,
}

impl RecordVisitor {
    fn render(self, level: &Level, target: &str) -> String {
        let mut text = format!("{} {}: {}", level, target, self.message);
        if !self.fields.is_empty() {
            text.push_str(&self.fields);
        }
        text
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::prelude::*;

    #[test]
    fn test_forwards_warnings_and_errors_only() {
        let (layer, mut queue) = chat_log_channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("not forwarded");
            tracing::info!("not forwarded either");
            tracing::warn!(target: "devwatch", "server unreachable");
            tracing::error!(target: "devwatch", status = 502, "unexpected failure");
        });

        let records = queue.drain();
        assert_eq!(
            records,
            vec![
                "WARN devwatch: server unreachable".to_string(),
                "ERROR devwatch: unexpected failure status=502".to_string(),
            ]
        );
    }

    #[test]
    fn test_skips_own_target() {
        let (layer, mut queue) = chat_log_channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: SINK_TARGET, "delivery failed");
        });

        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_skips_dependency_targets() {
        let (layer, mut queue) = chat_log_channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "hyper::client", "connection reset");
            tracing::error!(target: "reqwest::connect", "dns error");
            tracing::warn!(target: "devwatch_http::devman", "poll failed");
        });

        assert_eq!(
            queue.drain(),
            vec!["WARN devwatch_http::devman: poll failed".to_string()]
        );
    }

    #[test]
    fn test_string_fields_unquoted() {
        let (layer, mut queue) = chat_log_channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            let reason = "refused";
            tracing::warn!(target: "devwatch", reason, "connect failed");
        });

        assert_eq!(
            queue.drain(),
            vec!["WARN devwatch: connect failed reason=refused".to_string()]
        );
    }

    #[test]
    fn test_drain_empty_after_layer_dropped() {
        let (layer, mut queue) = chat_log_channel();
        drop(layer);
        assert!(queue.drain().is_empty());
    }
}
