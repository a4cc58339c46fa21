//! Caller-side cancellation for in-flight transfers.
//!
//! A `CancelToken` is a shared flag: the caller keeps one clone and hands
//! another to `fetch`; the transfer checks it from its progress callback and
//! stops with `FetchErrorKind::Cancelled`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
