//! Cross-run cache for Weave.
//!
//! A resolution run keeps its own in-memory fragment cache and throws it away
//! when the run ends. This crate persists results *between* runs so an
//! unchanged page does not have to be resolved again:
//!
//! - [`Cache`]: factory for named buckets
//! - [`CacheBucket`]: byte store keyed by string, validated by an etag
//! - [`CacheBucketExt`]: JSON and string helpers on top of any bucket
//!
//! # Implementations
//!
//! - [`NullCache`]: always misses (caching disabled)
//! - [`MemoryCache`]: process-local maps, shared between bucket handles
//! - [`FileCache`]: one file per entry under a versioned directory
//!
//! # Example
//!
//! ```
//! use weave_cache::{Cache, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! let bucket = cache.bucket("resolved");
//! bucket.set("index.xml", "opts-1", b"<page/>");
//! assert_eq!(bucket.get("index.xml", "opts-1"), Some(b"<page/>".to_vec()));
//! assert_eq!(bucket.get("index.xml", "opts-2"), None);
//! ```

mod ext;
mod file;
mod memory;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// Values are stored together with an etag, an opaque string chosen by the
/// caller (for example a fingerprint of the options that produced the value).
/// A lookup hits only when the stored etag matches the expected one.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` on a miss or etag mismatch. An empty `etag` skips the
    /// etag check.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value, replacing any previous entry for `key`.
    ///
    /// Failures are logged and otherwise ignored: a cache that cannot be
    /// written behaves like an empty one.
    fn set(&self, key: &str, etag: &str, value: &[u8]);

    /// Drop the entry for `key`, if any.
    fn remove(&self, key: &str);
}

/// Factory for named [`CacheBucket`]s.
///
/// Handles returned for the same name share storage; different names never
/// see each other's entries.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// Bucket of a [`NullCache`].
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}

    fn remove(&self, _key: &str) {}
}

/// [`Cache`] that stores nothing. Used when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let bucket = NullCache.bucket("resolved");

        bucket.set("index.xml", "etag", b"<page/>");
        assert_eq!(bucket.get("index.xml", "etag"), None);
        assert_eq!(bucket.get("index.xml", ""), None);

        bucket.remove("index.xml");
    }
}
