//! devwatch HTTP - Devman and Telegram integration for devwatch
//!
//! This crate provides the network collaborators of the poll loop: the
//! Devman client that answers long-polling requests and the Telegram sender
//! that delivers notifications.

mod devman;
mod error;
mod telegram;

pub use devman::DevmanClient;
pub use telegram::{TelegramSender, SEND_TIMEOUT};

pub(crate) const USER_AGENT: &str = concat!("devwatch/", env!("CARGO_PKG_VERSION"));
