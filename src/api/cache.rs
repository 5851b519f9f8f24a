//! Public page cache
//!
//! Rendered public payloads (profile, single post) are kept in an
//! in-process cache. Publishing, saving or deleting a published post and
//! allocating a handle all go through [`PublicCache::invalidate_author`],
//! so stale public pages never outlive a write by more than the TTL.

use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;

/// How many cached pages to keep around
const MAX_CACHED_PAGES: u64 = 1024;

/// Upper bound on staleness, even without an invalidation
const PAGE_TTL: Duration = Duration::from_secs(300);

/// Cache for public-facing payloads
#[derive(Clone)]
pub struct PublicCache {
    /// The cached pages, keyed by kind + handle (+ slug)
    pages: Cache<String, Value>,
}

impl PublicCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            pages: Cache::builder()
                .max_capacity(MAX_CACHED_PAGES)
                .time_to_live(PAGE_TTL)
                .build(),
        }
    }

    /// Cache key for a profile page
    fn profile_key(handle: &str) -> String {
        format!("profile:{handle}")
    }

    /// Cache key for a single post page
    fn post_key(handle: &str, slug: &str) -> String {
        format!("post:{handle}:{slug}")
    }

    /// Get a cached profile payload
    pub async fn get_profile(&self, handle: &str) -> Option<Value> {
        self.pages.get(&Self::profile_key(handle)).await
    }

    /// Cache a profile payload
    pub async fn put_profile(&self, handle: &str, payload: Value) {
        self.pages.insert(Self::profile_key(handle), payload).await;
    }

    /// Get a cached post payload
    pub async fn get_post(&self, handle: &str, slug: &str) -> Option<Value> {
        self.pages.get(&Self::post_key(handle, slug)).await
    }

    /// Cache a post payload
    pub async fn put_post(&self, handle: &str, slug: &str, payload: Value) {
        self.pages
            .insert(Self::post_key(handle, slug), payload)
            .await;
    }

    /// Drop the cached pages of an author
    ///
    /// The invalidation hook for every write that can change what the
    /// public sees.
    pub async fn invalidate_author(&self, handle: &str, slug: Option<&str>) {
        self.pages.invalidate(&Self::profile_key(handle)).await;

        if let Some(slug) = slug {
            self.pages.invalidate(&Self::post_key(handle, slug)).await;
        }
    }
}

impl Default for PublicCache {
    fn default() -> Self {
        Self::new()
    }
}
