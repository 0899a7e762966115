//! CLI command implementations

pub mod reviews;
pub mod send_test;
pub mod watch;

pub use reviews::ReviewsArgs;
pub use send_test::SendTestArgs;
pub use watch::WatchArgs;
