//! Review results as reported by the long-polling endpoint
//!
//! The endpoint answers either with a batch of new attempt results or with a
//! timeout; both carry the cursor the next request should start from.

mod cursor;
mod response;

pub use cursor::Cursor;
pub use response::{AttemptResult, PollResponse};
