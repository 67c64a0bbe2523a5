//! Pacing and cancellation-aware suspension
//!
//! # Components
//!
//! - `RateLimiter`: draws randomized cooldowns and waits for them
//! - `pause`: a sleep that ends early when the run is cancelled

mod limiter;

pub use limiter::{sample, RateLimiter};

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `cancel` fires first
///
/// Returns true if the full duration elapsed.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }

    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Fails with `Cancelled` once the token has fired
pub fn ensure_active(cancel: &CancellationToken) -> crate::Result<()> {
    if cancel.is_cancelled() {
        Err(crate::LinkreachError::Cancelled)
    } else {
        Ok(())
    }
}
