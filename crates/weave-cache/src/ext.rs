//! Typed access to [`CacheBucket`]s.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// JSON helpers available on every [`CacheBucket`].
///
/// Kept off the base trait so that it stays object-safe and free of serde.
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve and deserialize a JSON value.
    ///
    /// Entries that no longer deserialize (e.g. written by an older format)
    /// count as misses.
    fn get_json<T: DeserializeOwned>(&self, key: &str, etag: &str) -> Option<T> {
        let bytes = self.get(key, etag)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, "Discarding unreadable cache entry: {e}");
                None
            }
        }
    }

    /// Serialize a value as JSON and store it.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set(key, etag, &bytes),
            Err(e) => tracing::warn!(key, "Failed to serialize cache entry: {e}"),
        }
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}
