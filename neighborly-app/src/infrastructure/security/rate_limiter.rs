use dashmap::DashMap;
use neighborly_errors::AppError;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const CLEANUP_INTERVAL_SECS: u64 = 300;

#[derive(Clone)]
struct WriteRecord {
    minute_count: u32,
    hour_count: u32,
    minute_start: Instant,
    hour_start: Instant,
}

impl Default for WriteRecord {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            minute_count: 0,
            hour_count: 0,
            minute_start: now,
            hour_start: now,
        }
    }
}

/// Per-client write budget: a fixed minute window and a fixed hour window.
#[derive(Clone)]
pub struct RateLimiter {
    per_minute: u32,
    per_hour: u32,
    writes: Arc<DashMap<IpAddr, WriteRecord>>,
    last_cleanup: Arc<std::sync::Mutex<Instant>>,
}

impl RateLimiter {
    pub fn new(per_minute: u32, per_hour: u32) -> Self {
        Self {
            per_minute,
            per_hour,
            writes: Arc::new(DashMap::new()),
            last_cleanup: Arc::new(std::sync::Mutex::new(Instant::now())),
        }
    }

    /// Counts one write for `ip`, or fails with the seconds left until the
    /// exhausted window reopens.
    pub fn check(&self, ip: IpAddr) -> Result<(), AppError> {
        self.maybe_cleanup();

        let now = Instant::now();
        let mut record = self.writes.entry(ip).or_default();

        if now.duration_since(record.minute_start) > Duration::from_secs(60) {
            record.minute_count = 0;
            record.minute_start = now;
        }

        if now.duration_since(record.hour_start) > Duration::from_secs(3600) {
            record.hour_count = 0;
            record.hour_start = now;
        }

        if record.minute_count >= self.per_minute {
            let wait_secs = 60u64.saturating_sub(now.duration_since(record.minute_start).as_secs());
            tracing::warn!(%ip, wait_secs, "per-minute write limit reached");
            return Err(AppError::RateLimited(wait_secs.max(1)));
        }

        if record.hour_count >= self.per_hour {
            let wait_secs = 3600u64.saturating_sub(now.duration_since(record.hour_start).as_secs());
            tracing::warn!(%ip, wait_secs, "hourly write limit reached");
            return Err(AppError::RateLimited(wait_secs.max(1)));
        }

        record.minute_count += 1;
        record.hour_count += 1;

        Ok(())
    }

    fn maybe_cleanup(&self) {
        let Ok(mut last_cleanup) = self.last_cleanup.lock() else {
            return;
        };
        if last_cleanup.elapsed() > Duration::from_secs(CLEANUP_INTERVAL_SECS) {
            let cutoff = Instant::now() - Duration::from_secs(3600);
            self.writes.retain(|_, v| v.hour_start > cutoff);
            *last_cleanup = Instant::now();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(20, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn test_minute_limit() {
        let limiter = RateLimiter::new(3, 100);
        for _ in 0..3 {
            assert!(limiter.check(ip(1)).is_ok());
        }
        assert!(matches!(limiter.check(ip(1)), Err(AppError::RateLimited(secs)) if secs >= 1 && secs <= 60));
    }

    #[test]
    fn test_hour_limit_applies_before_minute_limit() {
        let limiter = RateLimiter::new(10, 2);
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_ok());
        assert!(matches!(limiter.check(ip(1)), Err(AppError::RateLimited(secs)) if secs > 60));
    }

    #[test]
    fn test_clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, 10);
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_err());
        assert!(limiter.check(ip(2)).is_ok());
    }
}
