//! Time-bounded memoization of feed responses.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::error::Result;
use crate::core::types::PriceSeries;

use super::provider::{PriceFeed, SeriesRequest};

struct CacheEntry {
    series: PriceSeries,
    fetched_at: Instant,
}

/// Wraps a feed and serves repeated requests from memory until `ttl` elapses.
///
/// Failed fetches are not cached.
pub struct CachedFeed<F> {
    inner: F,
    ttl: Duration,
    entries: Mutex<HashMap<SeriesRequest, CacheEntry>>,
}

impl<F: PriceFeed> CachedFeed<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop one cached response.
    pub fn invalidate(&self, request: &SeriesRequest) -> bool {
        self.entries.lock().remove(request).is_some()
    }

    /// Drop every cached response.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached responses, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    fn lookup(&self, request: &SeriesRequest) -> Option<PriceSeries> {
        let entries = self.entries.lock();
        let entry = entries.get(request)?;
        (entry.fetched_at.elapsed() < self.ttl).then(|| entry.series.clone())
    }
}

impl<F: PriceFeed> PriceFeed for CachedFeed<F> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get_series(&self, request: &SeriesRequest) -> Result<PriceSeries> {
        if let Some(series) = self.lookup(request) {
            tracing::debug!(ticker = %request.ticker, "feed cache hit");
            return Ok(series);
        }

        tracing::debug!(ticker = %request.ticker, backend = self.inner.name(), "feed cache miss");
        // Fetch outside the lock so slow backends don't serialize unrelated requests.
        let series = self.inner.get_series(request)?;
        self.entries.lock().insert(
            request.clone(),
            CacheEntry {
                series: series.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Date;
    use crate::feed::provider::InMemoryFeed;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFeed {
        inner: InMemoryFeed,
        calls: AtomicUsize,
    }

    impl PriceFeed for CountingFeed {
        fn name(&self) -> &str {
            "counting"
        }

        fn get_series(&self, request: &SeriesRequest) -> Result<PriceSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_series(request)
        }
    }

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn counting() -> CountingFeed {
        let series =
            PriceSeries::new(vec![d(2024, 1, 2), d(2024, 1, 3)], vec![100.0, 101.0], None).unwrap();
        CountingFeed {
            inner: InMemoryFeed::new().with_series("SPY", series),
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_hit_skips_backend() {
        let feed = CachedFeed::new(counting(), Duration::from_secs(3600));
        let request = SeriesRequest::daily("SPY", d(2024, 1, 1), d(2024, 1, 31));

        let first = feed.get_series(&request).unwrap();
        let second = feed.get_series(&request).unwrap();
        assert_eq!(first, second);
        assert_eq!(feed.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(feed.len(), 1);

        assert!(feed.invalidate(&request));
        feed.get_series(&request).unwrap();
        assert_eq!(feed.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_expired_entries_refetch() {
        let feed = CachedFeed::new(counting(), Duration::ZERO);
        let request = SeriesRequest::daily("SPY", d(2024, 1, 1), d(2024, 1, 31));
        feed.get_series(&request).unwrap();
        feed.get_series(&request).unwrap();
        assert_eq!(feed.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_errors_not_cached() {
        let feed = CachedFeed::new(counting(), Duration::from_secs(3600));
        let request = SeriesRequest::daily("QQQ", d(2024, 1, 1), d(2024, 1, 31));
        assert!(feed.get_series(&request).is_err());
        assert!(feed.is_empty());
        feed.clear();
    }
}
