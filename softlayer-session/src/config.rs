//! Session configuration.
//!
//! - [`RetryPolicy`]: Retry behavior with exponential backoff

mod retry;

pub use retry::{ExponentialBackoff, RetryPolicy, defaults, retry_with_policy};
