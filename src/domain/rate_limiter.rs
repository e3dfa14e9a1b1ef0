//! Rolling-window request limiter keyed by client address.
//!
//! [`RateLimiter`] keeps, per key, the timestamps of accepted requests that
//! are still inside the window. Every check prunes expired timestamps first,
//! then admits the request only while fewer than `limit` remain. Clients
//! idle for a whole window are swept out.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::MarketError;

/// Per-key sliding window limiter behind a single mutex.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<Windows>,
    limit: usize,
    window: Duration,
}

#[derive(Debug, Default)]
struct Windows {
    hits: HashMap<String, Vec<Instant>>,
    last_sweep: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter admitting `limit` requests per `window` per key.
    #[must_use]
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            state: Mutex::new(Windows::default()),
            limit,
            window,
        }
    }

    /// Records a request for `key` at the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::RateLimited`] when the key already used its
    /// quota inside the window.
    pub async fn check(&self, key: &str) -> Result<(), MarketError> {
        self.check_at(key, Instant::now()).await
    }

    /// Records a request for `key` at `now`.
    ///
    /// At most once per window, keys without a hit inside the window are
    /// dropped so the map only holds recently active clients.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::RateLimited`] when the key already used its
    /// quota inside the window.
    pub async fn check_at(&self, key: &str, now: Instant) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;
        self.sweep(&mut state, now);

        let times = state.hits.entry(key.to_string()).or_default();
        times.retain(|t| now.saturating_duration_since(*t) < self.window);

        if times.len() >= self.limit {
            let retry_after = times
                .first()
                .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(self.window);
            if times.is_empty() {
                state.hits.remove(key);
            }
            return Err(MarketError::RateLimited {
                retry_after_ms: u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
            });
        }

        times.push(now);
        Ok(())
    }

    fn sweep(&self, state: &mut Windows, now: Instant) {
        let due = state
            .last_sweep
            .is_none_or(|last| now.saturating_duration_since(last) >= self.window);
        if !due {
            return;
        }
        let before = state.hits.len();
        state.hits.retain(|_, times| {
            times
                .last()
                .is_some_and(|latest| now.saturating_duration_since(*latest) < self.window)
        });
        state.last_sweep = Some(now);
        let dropped = before - state.hits.len();
        if dropped > 0 {
            tracing::debug!(dropped, tracked = state.hits.len(), "rate limiter swept idle clients");
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.state.lock().await.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn fourth_request_in_window_is_rejected() {
        let limiter = RateLimiter::new(3, WINDOW);
        let t0 = Instant::now();

        for offset in 0..3 {
            let res = limiter.check_at("10.0.0.1", t0 + Duration::from_secs(offset)).await;
            assert!(res.is_ok());
        }

        let fourth = limiter.check_at("10.0.0.1", t0 + Duration::from_secs(3)).await;
        assert!(matches!(
            fourth,
            Err(MarketError::RateLimited { retry_after_ms }) if retry_after_ms == 57_000
        ));
    }

    #[tokio::test]
    async fn request_succeeds_once_first_hit_expires() {
        let limiter = RateLimiter::new(3, WINDOW);
        let t0 = Instant::now();
        for offset in 0..3 {
            let _ = limiter.check_at("10.0.0.1", t0 + Duration::from_secs(offset)).await;
        }

        let later = limiter.check_at("10.0.0.1", t0 + WINDOW).await;
        assert!(later.is_ok());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new(1, WINDOW);
        let t0 = Instant::now();
        assert_ok!(limiter.check_at("a", t0).await);
        assert_ok!(limiter.check_at("b", t0).await);
        assert_err!(limiter.check_at("a", t0).await);
        assert_eq!(limiter.tracked_keys().await, 2);
    }

    #[tokio::test]
    async fn rejected_requests_do_not_extend_the_window() {
        let limiter = RateLimiter::new(1, WINDOW);
        let t0 = Instant::now();
        assert!(limiter.check_at("a", t0).await.is_ok());
        assert!(limiter.check_at("a", t0 + Duration::from_secs(30)).await.is_err());
        assert!(limiter.check_at("a", t0 + WINDOW).await.is_ok());
    }

    #[tokio::test]
    async fn idle_clients_are_forgotten() {
        let limiter = RateLimiter::new(3, WINDOW);
        let t0 = Instant::now();
        for n in 0..1_000 {
            assert_ok!(limiter.check_at(&format!("10.0.{}.{}", n / 256, n % 256), t0).await);
        }
        assert_eq!(limiter.tracked_keys().await, 1_000);

        let later = t0 + WINDOW + Duration::from_secs(3_600);
        assert_ok!(limiter.check_at("192.0.2.1", later).await);
        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn clients_active_in_the_window_survive_a_sweep() {
        let limiter = RateLimiter::new(1, WINDOW);
        let t0 = Instant::now();
        assert_ok!(limiter.check_at("old", t0).await);
        assert_ok!(limiter.check_at("recent", t0 + Duration::from_secs(50)).await);

        assert_ok!(limiter.check_at("new", t0 + WINDOW).await);
        assert_eq!(limiter.tracked_keys().await, 2);
        assert_err!(limiter.check_at("recent", t0 + WINDOW).await);
    }

    #[tokio::test]
    async fn zero_limit_rejects_without_tracking() {
        let limiter = RateLimiter::new(0, WINDOW);
        assert_err!(limiter.check_at("a", Instant::now()).await);
        assert_eq!(limiter.tracked_keys().await, 0);
    }
}
