use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_TTL_SECONDS: u64 = 600;
/// Longest configurable lifetime, ten years
pub const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Cache lifetime from a seconds count, `None` outside `1..=MAX_TTL_SECONDS`
pub fn ttl_from_secs(secs: u64) -> Option<Duration> {
    if !(1..=MAX_TTL_SECONDS).contains(&secs) {
        return None;
    }
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// In-memory map whose entries vanish `ttl` after insertion.
///
/// Expired entries are dropped lazily when looked up; nothing else evicts.
/// A negative `ttl` is treated as zero, and an expiry past the calendar's end
/// saturates instead of overflowing.
pub struct TtlCache<V> {
    map: Mutex<HashMap<String, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
            ttl: ttl.max(Duration::zero()),
            clock,
        }
    }

    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.map.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut map = self.lock();
        match map.get(key) {
            Some(entry) if now <= entry.expires_at => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
        map.remove(key);
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.lock().insert(key.into(), Entry { value, expires_at });
    }

    /// Number of stored entries, expired ones included until they are looked up
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (Arc<ManualClock>, TtlCache<String>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ttl = ttl_from_secs(DEFAULT_TTL_SECONDS).unwrap();
        let cache = TtlCache::new(ttl, clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_value_available_until_ttl() {
        let (clock, cache) = cache();
        cache.insert("https://www.tiktok.com/@a/video/1", "meta".to_string());

        clock.advance(Duration::seconds(599));
        assert_eq!(
            cache.get("https://www.tiktok.com/@a/video/1").as_deref(),
            Some("meta")
        );

        clock.advance(Duration::seconds(1));
        assert_eq!(
            cache.get("https://www.tiktok.com/@a/video/1").as_deref(),
            Some("meta")
        );
    }

    #[test]
    fn test_expired_value_is_dropped() {
        let (clock, cache) = cache();
        cache.insert("k", "v".to_string());
        clock.advance(Duration::seconds(601));

        assert_eq!(cache.len(), 1);
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_refreshes_expiry() {
        let (clock, cache) = cache();
        cache.insert("k", "old".to_string());
        clock.advance(Duration::seconds(500));
        cache.insert("k", "new".to_string());
        clock.advance(Duration::seconds(500));
        assert_eq!(cache.get("k").as_deref(), Some("new"));
    }

    #[test]
    fn test_missing_key() {
        let (_, cache) = cache();
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn test_ttl_from_secs_bounds() {
        assert_eq!(ttl_from_secs(600), Some(Duration::seconds(600)));
        assert_eq!(ttl_from_secs(1), Some(Duration::seconds(1)));
        assert!(ttl_from_secs(MAX_TTL_SECONDS).is_some());
        assert!(ttl_from_secs(0).is_none());
        assert!(ttl_from_secs(MAX_TTL_SECONDS + 1).is_none());
        assert!(ttl_from_secs(u64::MAX).is_none());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let cache = TtlCache::with_system_clock(Duration::MAX);
        cache.insert("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC - Duration::seconds(10)));
        let cache = TtlCache::new(Duration::seconds(DEFAULT_TTL_SECONDS as i64), clock.clone());
        cache.insert("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_negative_ttl_is_zero() {
        let (clock, _) = cache();
        let cache = TtlCache::new(Duration::seconds(-5), clock.clone());
        assert_eq!(cache.ttl(), Duration::zero());

        cache.insert("k", "v".to_string());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        clock.advance(Duration::seconds(1));
        assert!(cache.get("k").is_none());
    }
}
