//! Call spacing and cooldown primitives for the suggestion client.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use vendir_core::SuggestError;

/// Enforces a minimum delay between consecutive calls.
///
/// The lock is held across the sleep on purpose: concurrent callers are
/// serialized, which is exactly what a provider-wide rate limit needs.
pub(crate) struct Throttle {
    min_delay: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub(crate) fn new(min_delay_ms: u64) -> Self {
        Self {
            min_delay: Duration::from_millis(min_delay_ms),
            last_call: Mutex::new(None),
        }
    }

    /// Waits until at least `min_delay` has passed since the previous call,
    /// then records the new call time.
    pub(crate) async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Provider-wide backoff window engaged after a 429.
///
/// While active, calls fail immediately with [`SuggestError::RateLimited`]
/// so a sweep skips records instead of stalling on a provider that already
/// told us to go away.
pub(crate) struct Cooldown {
    until: Mutex<Option<Instant>>,
}

impl Cooldown {
    pub(crate) fn new() -> Self {
        Self {
            until: Mutex::new(None),
        }
    }

    /// Errors with `RateLimited` while the window is active.
    pub(crate) async fn check(&self) -> Result<(), SuggestError> {
        let mut until = self.until.lock().await;
        if let Some(deadline) = *until {
            let now = Instant::now();
            if now < deadline {
                return Err(SuggestError::RateLimited {
                    retry_after_secs: (deadline - now).as_secs().max(1),
                });
            }
            *until = None;
        }
        Ok(())
    }

    pub(crate) async fn engage(&self, duration: Duration) {
        let mut until = self.until.lock().await;
        *until = Some(Instant::now() + duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn throttle_spaces_out_consecutive_calls() {
        let throttle = Throttle::new(50);
        let start = Instant::now();
        throttle.wait().await;
        throttle.wait().await;
        assert!(
            start.elapsed() >= Duration::from_millis(50),
            "second call must wait out the minimum delay"
        );
    }

    #[tokio::test]
    async fn throttle_first_call_is_immediate() {
        let throttle = Throttle::new(1000);
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn cooldown_blocks_then_clears() {
        let cooldown = Cooldown::new();
        assert!(cooldown.check().await.is_ok());

        cooldown.engage(Duration::from_millis(40)).await;
        assert!(matches!(
            cooldown.check().await,
            Err(SuggestError::RateLimited { .. })
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cooldown.check().await.is_ok());
    }
}
