//! Global request spacing shared by every scan worker

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum interval between consecutive requests.
/// Clones share the same clock, so spacing holds across workers.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// A zero interval means unlimited
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_delay_ms(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_unlimited(&self) -> bool {
        self.interval.is_zero()
    }

    /// Waits until the next request slot; the first request never waits
    pub async fn wait(&self) {
        if self.is_unlimited() {
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}
