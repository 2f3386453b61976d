//! Retry engine: exponential backoff with jitter and cancellation-aware
//! sleeping (§4.6).

use hfmirror_core::Settings;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const GROWTH_FACTOR: f64 = 1.6;
const MAX_JITTER_MS: u64 = 120;

/// Backoff state for one retry loop. `next()` is called once per attempt.
pub struct Backoff {
    next: Duration,
    max: Duration,
    attempts_left: u32,
}

impl Backoff {
    /// Build a backoff sequence from the engine's configured settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            next: settings.backoff_initial,
            max: settings.backoff_max,
            attempts_left: settings.retries,
        }
    }

    /// Whether another attempt is permitted.
    #[must_use]
    pub const fn has_attempts_left(&self) -> bool {
        self.attempts_left > 0
    }

    /// Consume one attempt and return the delay to sleep before retrying.
    ///
    /// Growth is applied to `next` *after* returning the current delay plus
    /// jitter, and clamped to `max`.
    pub fn next_delay(&mut self) -> Duration {
        self.attempts_left = self.attempts_left.saturating_sub(1);

        let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
        let delay = self.next + Duration::from_millis(jitter_ms);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let grown_ms = (self.next.as_millis() as f64 * GROWTH_FACTOR) as u64;
        self.next = Duration::from_millis(grown_ms).min(self.max);

        delay
    }
}

/// Sleep for `delay`, returning `false` immediately (without sleeping) if
/// `cancel` fires first.
pub async fn sleep_cancellable(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
