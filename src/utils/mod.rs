//! Utility modules supporting the source adapters.
//!
//! - [`HttpClient`]: shared HTTP client built from the `[http]` configuration
//! - [`RetryPolicy`]: bounded retry schedule with optional exponential backoff
//! - [`with_retry`]: execute an operation, retrying transient errors
//! - [`Sleeper`]: the suspension seam used between attempts, with [`TokioSleeper`]
//!   for real runs and [`RecordingSleeper`] for tests
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use lit_sweep::sources::SourceError;
//! use lit_sweep::utils::{with_retry, RetryPolicy, TokioSleeper};
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let policy = RetryPolicy::default().max_attempts(3);
//! let data = with_retry(&policy, &TokioSleeper, || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod retry;

pub use http::HttpClient;
pub use retry::{with_retry, RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};
