//! Caller-side retry with backoff.
//!
//! `fetch` makes exactly one attempt. Callers that want retries wrap it with
//! `run_with_retry`; only transient failures (timeouts, connection trouble,
//! interrupted streams, 429/5xx) are retried.

mod policy;
mod run;

pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
