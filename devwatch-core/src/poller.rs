//! Long-polling loop that turns review results into chat notifications
//!
//! Each step sends the current cursor to the review endpoint and classifies
//! what came back. Successful responses always move the cursor to the value
//! the server suggests; failures keep it and decide how long to wait before
//! the next attempt:
//!
//! | outcome             | cursor                    | delay               |
//! |---------------------|---------------------------|---------------------|
//! | found               | `last_attempt_timestamp`  | none                |
//! | timeout             | `timestamp_to_request`    | none                |
//! | request timed out   | unchanged                 | none                |
//! | connection failure  | unchanged                 | connection backoff  |
//! | anything else       | unchanged                 | error backoff       |

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::FailureKind;
use crate::log_sink::{LogQueue, SINK_TARGET};
use crate::notifier::Notifier;
use crate::review::{Cursor, PollResponse};
use crate::{Error, Result};

/// Source of long-polling responses
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Ask for results newer than `cursor`, giving up after `timeout`
    async fn poll(&self, cursor: Cursor, timeout: Option<Duration>) -> Result<PollResponse>;
}

/// Delays applied after failed poll attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Wait after the server could not be reached
    #[serde(with = "humantime_serde")]
    pub connection_backoff: Duration,

    /// Wait after any other failure
    #[serde(with = "humantime_serde")]
    pub error_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connection_backoff: Duration::from_secs(5),
            error_backoff: Duration::from_secs(60),
        }
    }
}

/// Where the loop goes after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Poll again right away
    Polling,
    /// Sleep, then poll again with the same cursor
    Backoff(Duration),
}

/// Result of a single poll step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// New results were delivered
    Found { notified: usize },
    /// Server-side wait expired without results
    Timeout,
    /// The request exceeded the client timeout
    RequestTimeout,
    /// The server was unreachable
    ConnectionFailure,
    /// Anything else, including failed notifications
    Unexpected,
}

impl PollOutcome {
    /// Next loop state under `policy`
    pub fn next_state(&self, policy: &RetryPolicy) -> PollState {
        match self {
            PollOutcome::Found { .. } | PollOutcome::Timeout | PollOutcome::RequestTimeout => {
                PollState::Polling
            }
            PollOutcome::ConnectionFailure => PollState::Backoff(policy.connection_backoff),
            PollOutcome::Unexpected => PollState::Backoff(policy.error_backoff),
        }
    }
}

/// Drives the long-polling cycle and owns the cursor
pub struct ResultPoller<R> {
    source: R,
    notifier: Notifier,
    policy: RetryPolicy,
    request_timeout: Option<Duration>,
    cursor: Cursor,
    log_queue: Option<LogQueue>,
}

impl<R: ReviewSource> ResultPoller<R> {
    /// Create a poller whose cursor starts at the current time
    pub fn new(source: R, notifier: Notifier, policy: RetryPolicy) -> Self {
        Self {
            source,
            notifier,
            policy,
            request_timeout: None,
            cursor: Cursor::now(),
            log_queue: None,
        }
    }

    /// Start from an explicit cursor instead of now
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    /// Bound each poll request; `None` waits indefinitely
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Forward queued log records to the chat between poll requests
    pub fn with_log_queue(mut self, queue: LogQueue) -> Self {
        self.log_queue = Some(queue);
        self
    }

    /// Current cursor
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Retry policy in effect
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one request/response step
    pub async fn poll_once(&mut self) -> PollOutcome {
        debug!(cursor = %self.cursor, "Polling for review results");

        let err = match self.step().await {
            Ok(outcome) => return outcome,
            Err(e) => e,
        };

        let outcome = PollOutcome::from(&err);
        match outcome {
            PollOutcome::RequestTimeout => {
                debug!(error = %err, "Poll request timed out, retrying");
            }
            PollOutcome::ConnectionFailure => {
                warn!(
                    error = %err,
                    backoff = ?self.policy.connection_backoff,
                    "Review server unreachable"
                );
            }
            _ => {
                error!(
                    error = %err,
                    backoff = ?self.policy.error_backoff,
                    "Unexpected failure while polling"
                );
            }
        }
        outcome
    }

    async fn step(&mut self) -> Result<PollOutcome> {
        let response = self.source.poll(self.cursor, self.request_timeout).await?;
        info!(status = response.status(), "Received poll response");

        let outcome = match &response {
            PollResponse::Found { attempts, .. } => {
                for attempt in attempts {
                    self.notifier.notify(attempt).await?;
                }
                PollOutcome::Found {
                    notified: attempts.len(),
                }
            }
            PollResponse::Timeout { .. } => PollOutcome::Timeout,
        };

        self.cursor = response.resume_cursor();
        Ok(outcome)
    }

    /// Deliver queued log records; failures are logged and dropped
    pub async fn flush_log_queue(&mut self) {
        let Some(queue) = self.log_queue.as_mut() else {
            return;
        };

        for record in queue.drain() {
            if let Err(e) = self.notifier.notify_log(&record).await {
                warn!(target: SINK_TARGET, error = %e, "Failed to forward log record to chat");
            }
        }
    }

    /// Poll forever
    ///
    /// Never returns; stop it by dropping the future.
    pub async fn run(&mut self) {
        info!(cursor = %self.cursor, "Starting review polling");

        loop {
            self.flush_log_queue().await;

            let outcome = self.poll_once().await;
            if let PollState::Backoff(delay) = outcome.next_state(&self.policy) {
                self.flush_log_queue().await;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

impl From<&Error> for PollOutcome {
    fn from(err: &Error) -> Self {
        match err.failure_kind() {
            FailureKind::RequestTimeout => PollOutcome::RequestTimeout,
            FailureKind::ConnectionFailure => PollOutcome::ConnectionFailure,
            FailureKind::Unexpected => PollOutcome::Unexpected,
        }
    }
}
