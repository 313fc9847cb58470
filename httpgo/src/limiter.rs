/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Mutex;
use std::time::{Duration, Instant};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

struct TokenBucket {
    limit: f64,
    burst: u64,
    token: u64,
    last: Instant,
}

impl TokenBucket {
    fn new(qps: u32, now: Instant) -> Self {
        TokenBucket {
            limit: f64::from(qps),
            burst: u64::from(qps),
            token: u64::from(qps),
            last: now,
        }
    }

    /// whole seconds and the sub-second part are scaled separately, then truncated
    fn revoked(&self, d: Duration) -> u64 {
        let sec = d.as_secs() as f64 * self.limit;
        let nsec = f64::from(d.subsec_nanos()) * self.limit;
        (sec + nsec / NANOS_PER_SEC) as u64
    }

    fn allow(&mut self, now: Instant) -> bool {
        let revoked = self.revoked(now.saturating_duration_since(self.last));
        self.token = self.token.saturating_sub(revoked);

        if self.token < self.burst {
            self.token += 1;
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Global admission gate shared by all workers.
///
/// A zero qps builds an unlimited limiter that admits every call.
pub struct RateLimiter {
    bucket: Option<Mutex<TokenBucket>>,
}

impl RateLimiter {
    pub fn new(qps: u32) -> Self {
        Self::new_at(qps, Instant::now())
    }

    fn new_at(qps: u32, now: Instant) -> Self {
        let bucket = if qps > 0 {
            Some(Mutex::new(TokenBucket::new(qps, now)))
        } else {
            None
        };
        RateLimiter { bucket }
    }

    pub fn is_unlimited(&self) -> bool {
        self.bucket.is_none()
    }

    /// Never waits. A denied caller is expected to poll again.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    pub(crate) fn allow_at(&self, now: Instant) -> bool {
        let Some(bucket) = &self.bucket else {
            return true;
        };
        let mut bucket = bucket.lock().unwrap_or_else(|e| e.into_inner());
        bucket.allow(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited() {
        let limiter = RateLimiter::new(0);
        assert!(limiter.is_unlimited());
        for _ in 0..10_000 {
            assert!(limiter.allow());
        }
    }

    #[test]
    fn full_at_start() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(10, start);
        assert!(!limiter.allow_at(start));
        assert!(!limiter.allow_at(start + Duration::from_millis(50)));
        assert!(limiter.allow_at(start + Duration::from_millis(100)));
    }

    #[test]
    fn burst_after_idle() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(10, start);

        let now = start + Duration::from_secs(1);
        let admitted = (0..20).filter(|_| limiter.allow_at(now)).count();
        assert_eq!(admitted, 10);
    }

    #[test]
    fn converge_to_qps() {
        let start = Instant::now();
        let limiter = RateLimiter::new_at(100, start);

        let mut admitted = 0;
        for ms in 1..=10_000u64 {
            if limiter.allow_at(start + Duration::from_millis(ms)) {
                admitted += 1;
            }
        }
        assert!((990..=1010).contains(&admitted), "admitted {admitted}");
    }

    #[test]
    fn concurrent_callers() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let start = Instant::now();
        let limiter = Arc::new(RateLimiter::new_at(50, start));
        let admitted = Arc::new(AtomicUsize::new(0));
        let now = start + Duration::from_secs(5);

        let handles = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                let admitted = admitted.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if limiter.allow_at(now) {
                            admitted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(admitted.load(Ordering::Relaxed), 50);
    }
}
