//! devwatch core - review result polling and chat notifications
//!
//! This crate provides the long-polling loop that follows the Devman review
//! API, the notifier that turns review results into chat messages, and the
//! tracing layer that forwards warnings and errors to the same chat.

pub mod config;
pub mod error;
pub mod log_sink;
pub mod notifier;
pub mod poller;
pub mod review;
pub mod secrets;

pub use config::{Config, Settings};
pub use error::{Error, FailureKind, Result};
pub use log_sink::{chat_log_channel, ChatLogLayer, LogQueue};
pub use notifier::{MessageSender, Notifier};
pub use poller::{PollOutcome, PollState, ResultPoller, RetryPolicy, ReviewSource};
pub use review::{AttemptResult, Cursor, PollResponse};
pub use secrets::Secrets;
