use crate::config::Cooldown;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Randomized pacing between automated actions
///
/// Every outbound action is bracketed by a wait drawn uniformly from a
/// cooldown range. Bounds are in seconds; the conversion to [`Duration`]
/// happens here and nowhere else.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Range used when a call does not supply its own bounds
    cooldown: Cooldown,

    /// Cuts a wait short when the run is cancelled
    cancel: CancellationToken,
}

impl RateLimiter {
    pub fn new(cooldown: Cooldown, cancel: CancellationToken) -> Self {
        Self {
            cooldown: cooldown.normalized(),
            cancel,
        }
    }

    /// The configured default range
    pub fn cooldown(&self) -> Cooldown {
        self.cooldown
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Draws a delay without sleeping
    ///
    /// Each missing bound falls back to the configured one. An inverted
    /// range is swapped and negative bounds are clamped to zero, so the
    /// result is always a valid duration inside the effective range.
    pub fn draw(&self, min_seconds: Option<f64>, max_seconds: Option<f64>) -> Duration {
        let bounds = Cooldown::new(
            min_seconds.unwrap_or(self.cooldown.min),
            max_seconds.unwrap_or(self.cooldown.max),
        );
        sample(bounds)
    }

    /// Draws a delay and suspends the caller for it
    ///
    /// Returns the drawn duration. Never fails; if the run is cancelled
    /// the wait ends early and the caller is expected to check the token.
    pub async fn wait(&self, min_seconds: Option<f64>, max_seconds: Option<f64>) -> Duration {
        let delay = self.draw(min_seconds, max_seconds);
        tracing::debug!(seconds = delay.as_secs_f64(), "cooldown");
        super::pause(delay, &self.cancel).await;
        delay
    }

    /// Waits for a delay drawn from an explicit range
    pub async fn wait_within(&self, bounds: Cooldown) -> Duration {
        self.wait(Some(bounds.min), Some(bounds.max)).await
    }
}

/// Draws a uniformly distributed duration from `bounds`
pub fn sample(bounds: Cooldown) -> Duration {
    let bounds = bounds.normalized();
    let seconds = if bounds.min == bounds.max {
        bounds.min
    } else {
        rand::thread_rng().gen_range(bounds.min..=bounds.max)
    };
    Duration::from_secs_f64(seconds)
}
