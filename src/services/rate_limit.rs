//! Sliding-window request rate limiter

use std::collections::VecDeque;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Allows up to `max_requests` in any `period`. A full burst is allowed up
/// front; after that callers wait for the oldest request to age out.
pub struct RateLimiter {
    max_requests: usize,
    period: Duration,
    sent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, period: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            period,
            sent: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// 60 requests per minute, the rate iNaturalist asks API clients to keep to.
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Wait until a request may be sent and record it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut sent = self.sent.lock().await;
                let now = Instant::now();
                while sent
                    .front()
                    .is_some_and(|first| now.duration_since(*first) >= self.period)
                {
                    sent.pop_front();
                }
                match sent.front() {
                    Some(oldest) if sent.len() >= self.max_requests => {
                        self.period - now.duration_since(*oldest)
                    }
                    _ => {
                        sent.push_back(now);
                        return;
                    }
                }
            };
            debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            sleep(wait).await;
        }
    }

    /// Requests recorded in the current window.
    pub async fn in_window(&self) -> usize {
        let sent = self.sent.lock().await;
        let now = Instant::now();
        sent.iter()
            .filter(|at| now.duration_since(**at) < self.period)
            .count()
    }
}
