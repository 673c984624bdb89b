use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::ThrottleConfig;

/// Per-(action, client IP) failure counter over the injected TTL cache.
/// Once the limit is reached every further attempt is blocked until the
/// window lapses or a successful attempt clears the counter.
#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<TtlCache>,
    max_attempts: u64,
    window: Duration,
}

impl RateLimiter {
    #[must_use]
    pub fn new(cache: Arc<TtlCache>, config: &ThrottleConfig) -> Self {
        Self {
            cache,
            max_attempts: u64::from(config.max_attempts),
            window: Duration::from_secs(config.window_minutes * 60),
        }
    }

    fn key(action: &str, ip: &str) -> String {
        format!("auth_attempts:{action}:{ip}")
    }

    pub fn blocked(&self, action: &str, ip: &str) -> bool {
        self.cache
            .get(&Self::key(action, ip))
            .is_some_and(|attempts| attempts >= self.max_attempts)
    }

    /// Sliding window: every failure restarts the TTL
    pub fn record_failure(&self, action: &str, ip: &str) {
        let key = Self::key(action, ip);
        let attempts = self.cache.get(&key).unwrap_or(0) + 1;
        self.cache.put(&key, attempts, self.window);
    }

    pub fn clear(&self, action: &str, ip: &str) {
        self.cache.forget(&Self::key(action, ip));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(
            Arc::new(TtlCache::new()),
            &ThrottleConfig {
                max_attempts: 3,
                window_minutes: 30,
            },
        )
    }

    #[test]
    fn blocks_after_max_failures() {
        let limiter = limiter();
        assert!(!limiter.blocked("login", "10.0.0.1"));

        limiter.record_failure("login", "10.0.0.1");
        limiter.record_failure("login", "10.0.0.1");
        assert!(!limiter.blocked("login", "10.0.0.1"));

        limiter.record_failure("login", "10.0.0.1");
        assert!(limiter.blocked("login", "10.0.0.1"));
    }

    #[test]
    fn actions_and_ips_are_independent() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.record_failure("login", "10.0.0.1");
        }

        assert!(limiter.blocked("login", "10.0.0.1"));
        assert!(!limiter.blocked("register", "10.0.0.1"));
        assert!(!limiter.blocked("login", "10.0.0.2"));
    }

    #[test]
    fn success_resets_the_counter() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.record_failure("login", "10.0.0.1");
        }
        assert!(limiter.blocked("login", "10.0.0.1"));

        limiter.clear("login", "10.0.0.1");
        assert!(!limiter.blocked("login", "10.0.0.1"));
    }
}
