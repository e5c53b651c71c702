//! Concurrency limiter with randomized post-fetch pacing.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::infrastructure::config::PhaseConfig;

/// Shared by every unit of work in one phase; clones share the same bound
#[derive(Debug, Clone)]
pub struct Pacer {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    base_delay: Duration,
    jitter: Duration,
}

impl Pacer {
    pub fn new(config: &PhaseConfig) -> Self {
        let concurrency = config.concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            base_delay: Duration::from_millis(config.delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Wait for a fetch slot. Hold the permit across the fetch and its pause.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                // Only reachable if the semaphore was closed; proceed unbounded
                warn!("Concurrency limiter unavailable: {}", e);
                None
            }
        }
    }

    /// Delay drawn uniformly from `[base, base + jitter]`
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.base_delay;
        }
        self.base_delay + Duration::from_millis(fastrand::u64(0..=jitter_ms))
    }

    /// Post-fetch pause; suspends only the calling unit of work
    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!(delay_ms = delay.as_millis() as u64, "pacing");
        tokio::time::sleep(delay).await;
    }
}
