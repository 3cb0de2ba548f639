use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crate::models::{JobPosting, SearchQuery};

/// Default time-to-live of a cached search
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Cached result of one job-board search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub ttl_secs: u64,
    pub payload: Vec<JobPosting>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, ttl_secs: u64, payload: Vec<JobPosting>) -> Self {
        Self {
            key: key.into(),
            created_at: Utc::now(),
            ttl_secs,
            payload,
        }
    }

    /// Expired once strictly more than `ttl_secs` have passed
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > ChronoDuration::seconds(self.ttl_secs as i64)
    }
}

/// TTL cache for job-board searches.
///
/// Entries carry their own creation time and are evicted lazily on read.
/// The backing moka cache is internally synchronized, so concurrent searches
/// sharing a key never observe a torn entry. The moka TTL is only a memory
/// bound; expiry semantics come from `CacheEntry::is_expired_at`.
pub struct JobCache {
    entries: moka::future::Cache<String, CacheEntry>,
    ttl_secs: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl JobCache {
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let entries = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs.saturating_add(60)))
            .build();

        Self {
            entries,
            ttl_secs,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Live payload for `key`, if any
    pub async fn get(&self, key: &str) -> Option<Vec<JobPosting>> {
        self.get_at(key, Utc::now()).await
    }

    /// Live payload for `key` as seen at `now`; expired entries are removed
    pub async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<JobPosting>> {
        match self.entries.get(key).await {
            Some(entry) if !entry.is_expired_at(now) => {
                tracing::trace!("Search cache hit: {}", key);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.payload)
            }
            Some(_) => {
                tracing::debug!("Search cache entry expired: {}", key);
                self.entries.invalidate(key).await;
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                tracing::trace!("Search cache miss: {}", key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Live payload for `key`, or the payload produced by `fetch`.
    ///
    /// Concurrent callers that miss on the same key share a single `fetch`.
    /// A failed fetch is handed to every waiter and nothing is stored.
    pub async fn get_or_try_fetch<F, E>(&self, key: &str, fetch: F) -> Result<Vec<JobPosting>, Arc<E>>
    where
        F: Future<Output = Result<Vec<JobPosting>, E>>,
        E: Send + Sync + 'static,
    {
        if let Some(payload) = self.get(key).await {
            return Ok(payload);
        }

        let ttl_secs = self.ttl_secs;
        let entry = self
            .entries
            .try_get_with(key.to_string(), async move {
                let payload = fetch.await?;
                tracing::trace!("Search cache set: {} ({} postings)", key, payload.len());
                Ok(CacheEntry::new(key, ttl_secs, payload))
            })
            .await?;

        Ok(entry.payload)
    }

    /// Store a payload under `key` with the cache's TTL
    pub async fn put(&self, key: &str, payload: Vec<JobPosting>) {
        self.insert(CacheEntry::new(key, self.ttl_secs, payload)).await;
    }

    /// Store a fully built entry
    pub async fn insert(&self, entry: CacheEntry) {
        tracing::trace!("Search cache set: {} ({} postings)", entry.key, entry.payload.len());
        self.entries.insert(entry.key.clone(), entry).await;
    }

    /// Find a posting by id among live entries
    pub fn find_posting(&self, job_id: &str) -> Option<JobPosting> {
        let now = Utc::now();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .find_map(|(_, entry)| entry.payload.iter().find(|p| p.id == job_id).cloned())
    }

    pub async fn delete(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        CacheStats {
            entries: self.entries.entry_count(),
            hit_count: hits,
            miss_count: misses,
            hit_rate: if lookups > 0 { hits as f64 / lookups as f64 } else { 0.0 },
        }
    }
}

impl Default for JobCache {
    fn default() -> Self {
        Self::new(1000, DEFAULT_TTL_SECS)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a job search from its normalized arguments
    pub fn search(query: &SearchQuery) -> String {
        let keywords = query
            .keywords
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        let location = query
            .location
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .unwrap_or_default();
        let level = query
            .experience_level
            .map(|l| l.as_str())
            .unwrap_or("any");
        let language = query
            .language
            .as_deref()
            .and_then(crate::services::job_board::language_code)
            .unwrap_or_else(|| "any".to_string());
        let limit = query
            .limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "default".to_string());

        format!(
            "search:{}|{}|{}|{}|{}|{}",
            keywords, location, level, language, limit, query.remote
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExperienceLevel;

    fn create_posting(id: &str) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: "Rust Engineer".to_string(),
            company: "Ferris Inc".to_string(),
            location: "Remote".to_string(),
            description: String::new(),
            required_skills: vec!["Rust".to_string()],
            experience_required: "Not specified".to_string(),
            education_required: "Not specified".to_string(),
            language: "en".to_string(),
            qualifications: vec![],
            apply_url: String::new(),
            remote: true,
            job_types: vec![],
            synthetic: false,
        }
    }

    #[tokio::test]
    async fn test_cache_put_get() {
        let cache = JobCache::new(100, 60);
        cache.put("k", vec![create_posting("a")]).await;

        let payload = cache.get("k").await.expect("entry should be live");
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].id, "a");

        cache.delete("k").await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_entry_evicted_lazily_after_ttl() {
        let cache = JobCache::new(100, 3600);
        cache.put("k", vec![create_posting("a")]).await;

        let later = Utc::now() + ChronoDuration::seconds(3601);
        assert!(cache.get_at("k", later).await.is_none());
        // the expired entry is gone even for a reader at the original time
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let cache = JobCache::new(100, 60);
        assert!(cache.get("missing").await.is_none());
        cache.put("k", vec![]).await;
        assert!(cache.get("k").await.is_some());

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_find_posting_by_id() {
        let cache = JobCache::new(100, 60);
        cache.put("k", vec![create_posting("a"), create_posting("b")]).await;

        assert_eq!(cache.find_posting("b").map(|p| p.id), Some("b".to_string()));
        assert!(cache.find_posting("zzz").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_coalesce() {
        let cache = JobCache::new(100, 60);
        let calls = AtomicU64::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(vec![create_posting("a")])
        };

        let (a, b) = tokio::join!(
            cache.get_or_try_fetch("k", fetch()),
            cache.get_or_try_fetch("k", fetch())
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_not_stored() {
        let cache = JobCache::new(100, 60);

        let failed = cache
            .get_or_try_fetch("k", async { Err::<Vec<JobPosting>, _>("board down".to_string()) })
            .await;
        assert_eq!(failed.unwrap_err().as_str(), "board down");
        assert!(cache.get("k").await.is_none());
    }

    #[test]
    fn test_entry_expiry_boundary() {
        let entry = CacheEntry::new("k", 10, vec![]);
        assert!(!entry.is_expired_at(entry.created_at + ChronoDuration::seconds(10)));
        assert!(entry.is_expired_at(entry.created_at + ChronoDuration::seconds(11)));
    }

    #[test]
    fn test_cache_key_normalization() {
        let a = SearchQuery::new("  Data   Scientist ").with_location(" Paris ");
        let b = SearchQuery::new("data scientist").with_location("paris");
        assert_eq!(CacheKey::search(&a), CacheKey::search(&b));

        let c = SearchQuery::new("data scientist")
            .with_location("paris")
            .with_experience_level(ExperienceLevel::Entry);
        assert_ne!(CacheKey::search(&a), CacheKey::search(&c));

        let d = SearchQuery::new("data scientist").with_language("English");
        let e = SearchQuery::new("data scientist").with_language("en");
        assert_eq!(CacheKey::search(&d), CacheKey::search(&e));
    }
}
