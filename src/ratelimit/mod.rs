use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Outcome of a quota check for one client key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateCheck {
    pub allowed: bool,
    pub remaining: u32,
    /// Whole seconds until the window resets; only set on rejection.
    pub reset_in: Option<u64>,
}

/// One client's current window. Replaced wholesale once `reset_at` passes.
#[derive(Debug)]
struct RateWindow {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter keyed by client identifier.
///
/// Quota resets at discrete window boundaries: the first request for a key
/// (or the first after expiry) opens a fresh window, and the count within a
/// window is never decremented early.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request against `identifier` and reports the verdict.
    ///
    /// Rejected requests do not consume quota, so `count` can never exceed
    /// the configured maximum.
    pub fn check(&self, identifier: &str) -> RateCheck {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");

        match windows.get_mut(identifier) {
            Some(window) if now < window.reset_at => {
                if window.count >= self.max_requests {
                    let reset_in = (window.reset_at - now).as_secs_f64().ceil() as u64;
                    return RateCheck {
                        allowed: false,
                        remaining: 0,
                        reset_in: Some(reset_in),
                    };
                }
                window.count += 1;
                RateCheck {
                    allowed: true,
                    remaining: self.max_requests - window.count,
                    reset_in: None,
                }
            }
            _ => {
                windows.insert(identifier.to_string(), RateWindow {
                    count: 1,
                    reset_at: now + self.window,
                });
                RateCheck {
                    allowed: true,
                    remaining: self.max_requests - 1,
                    reset_in: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, secs: u64) -> FixedWindowLimiter {
        FixedWindowLimiter::new(max, Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_key_starts_full_window() {
        let limiter = limiter(30, 60);
        let check = limiter.check("10.0.0.1");
        assert!(check.allowed);
        assert_eq!(check.remaining, 29);
        assert_eq!(check.reset_in, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_strictly_decreases_then_rejects() {
        let limiter = limiter(5, 60);
        for expected in (0..5).rev() {
            let check = limiter.check("client");
            assert!(check.allowed);
            assert_eq!(check.remaining, expected);
        }
        let rejected = limiter.check("client");
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.reset_in, Some(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_does_not_consume_quota() {
        let limiter = limiter(1, 60);
        assert!(limiter.check("k").allowed);
        for _ in 0..3 {
            assert!(!limiter.check("k").allowed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_elapse_resets_quota() {
        let limiter = limiter(2, 60);
        limiter.check("k");
        limiter.check("k");
        assert!(!limiter.check("k").allowed);

        tokio::time::advance(Duration::from_secs(61)).await;

        let check = limiter.check("k");
        assert!(check.allowed);
        assert_eq!(check.remaining, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let limiter = limiter(1, 60);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_in_counts_down() {
        let limiter = limiter(1, 60);
        limiter.check("k");
        tokio::time::advance(Duration::from_secs(20)).await;
        let rejected = limiter.check("k");
        assert_eq!(rejected.reset_in, Some(40));
    }
}
