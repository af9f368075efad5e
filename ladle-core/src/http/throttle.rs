//! Per-host spacing of outgoing requests.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::{sleep_until, Instant};

/// Keeps requests to the same host at least `min_interval` apart.
///
/// Each caller reserves the next free slot for its host before sleeping, so
/// concurrent callers queue up instead of all firing after the same pause.
pub struct HostThrottle {
    min_interval: Duration,
    next_slot: DashMap<String, Instant>,
}

impl HostThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: DashMap::new(),
        }
    }

    /// Wait until a request to `host` is allowed.
    pub async fn wait(&self, host: &str) {
        if self.min_interval.is_zero() {
            return;
        }

        let now = Instant::now();
        // Hosts whose reservations have all passed need no entry.
        self.next_slot.retain(|_, next| *next > now);
        let slot = {
            let mut next = self.next_slot.entry(host.to_string()).or_insert(now);
            let slot = (*next).max(now);
            *next = slot + self.min_interval;
            slot
        };

        if slot > now {
            tracing::trace!(host, wait_ms = (slot - now).as_millis() as u64, "throttling request");
        }
        sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spaces_requests_to_same_host() {
        let throttle = HostThrottle::new(Duration::from_millis(200));
        let start = Instant::now();

        throttle.wait("a.test").await;
        assert!(start.elapsed() < Duration::from_millis(200));

        throttle.wait("a.test").await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn hosts_are_independent() {
        let throttle = HostThrottle::new(Duration::from_millis(200));
        let start = Instant::now();

        throttle.wait("a.test").await;
        throttle.wait("b.test").await;
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_never_waits() {
        let throttle = HostThrottle::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            throttle.wait("a.test").await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_hosts_are_forgotten() {
        let throttle = HostThrottle::new(Duration::from_millis(200));

        throttle.wait("a.test").await;
        throttle.wait("b.test").await;
        assert_eq!(throttle.next_slot.len(), 2);

        tokio::time::advance(Duration::from_secs(1)).await;
        throttle.wait("c.test").await;

        assert_eq!(throttle.next_slot.len(), 1);
        assert!(throttle.next_slot.contains_key("c.test"));
    }
}
