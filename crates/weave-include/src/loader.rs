//! Resolution with cross-run caching.
//!
//! [`CachedLoader`] stores the serialized output of each load together with
//! the modification time of every dependency. A later load of the same root
//! reuses the stored output only while all those mtimes are unchanged
//! (including dependencies that did not exist and still don't).

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use weave_cache::{Cache, CacheBucket, CacheBucketExt};
use weave_source::{ContentSource, Locator};

use crate::diagnostics::Diagnostic;
use crate::error::LoadError;
use crate::resolver::InclusionResolver;

/// Cache bucket holding resolved documents.
const BUCKET: &str = "resolved";

/// Output of [`CachedLoader::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutput {
    /// Root locator.
    pub locator: Locator,
    /// Serialized resolved document.
    pub xml: String,
    /// Every locator the result depends on, root first.
    pub dependencies: Vec<Locator>,
    /// Diagnostics recorded when the document was resolved.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the output came from the cache.
    pub cached: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedEntry {
    xml: String,
    dependencies: Vec<DependencyStamp>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DependencyStamp {
    locator: Locator,
    /// `None` when the dependency did not exist.
    mtime: Option<f64>,
}

/// [`InclusionResolver`] front end that reuses results across runs.
pub struct CachedLoader {
    resolver: InclusionResolver,
    bucket: Box<dyn CacheBucket>,
    etag: String,
}

impl CachedLoader {
    /// Wrap `resolver`, storing results in `cache`.
    #[must_use]
    pub fn new(resolver: InclusionResolver, cache: &dyn Cache) -> Self {
        let etag = fingerprint(&resolver);
        Self {
            resolver,
            bucket: cache.bucket(BUCKET),
            etag,
        }
    }

    /// The wrapped resolver.
    #[must_use]
    pub fn resolver(&self) -> &InclusionResolver {
        &self.resolver
    }

    /// Load and resolve `locator`, reusing a cached result when it is still
    /// fresh.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the root document cannot be fetched.
    pub fn load(&self, locator: &Locator) -> Result<LoadOutput, LoadError> {
        let key = cache_key(locator);

        if let Some(entry) = self.bucket.get_json::<CachedEntry>(&key, &self.etag) {
            if self.is_fresh(&entry) {
                tracing::info!(locator = %locator, "Using cached resolution");
                return Ok(LoadOutput {
                    locator: locator.clone(),
                    xml: entry.xml,
                    dependencies: entry.dependencies.into_iter().map(|d| d.locator).collect(),
                    diagnostics: entry.diagnostics,
                    cached: true,
                });
            }
            tracing::debug!(locator = %locator, "Cached resolution is stale");
        }

        let resolved = self.resolver.load(locator)?;
        let xml = resolved.to_xml();

        let entry = CachedEntry {
            xml: xml.clone(),
            dependencies: resolved
                .dependencies
                .iter()
                .map(|locator| DependencyStamp {
                    locator: locator.clone(),
                    mtime: self.mtime(locator),
                })
                .collect(),
            diagnostics: resolved.diagnostics.clone(),
        };
        self.bucket.set_json(&key, &self.etag, &entry);

        Ok(LoadOutput {
            locator: locator.clone(),
            xml,
            dependencies: resolved.dependencies,
            diagnostics: resolved.diagnostics,
            cached: false,
        })
    }

    /// Load several independent documents in parallel.
    ///
    /// Results are returned in the order of `locators`.
    #[must_use]
    pub fn load_many(&self, locators: &[Locator]) -> Vec<Result<LoadOutput, LoadError>> {
        locators.par_iter().map(|locator| self.load(locator)).collect()
    }

    /// Drop the cached result for `locator`.
    pub fn invalidate(&self, locator: &Locator) {
        self.bucket.remove(&cache_key(locator));
    }

    fn source(&self) -> &dyn ContentSource {
        self.resolver.source()
    }

    fn mtime(&self, locator: &Locator) -> Option<f64> {
        self.source().mtime(locator).ok()
    }

    fn is_fresh(&self, entry: &CachedEntry) -> bool {
        entry.dependencies.iter().all(|dep| {
            let current = self.mtime(&dep.locator);
            current.map(f64::to_bits) == dep.mtime.map(f64::to_bits)
        })
    }
}

/// SHA-256 of the root locator.
fn cache_key(locator: &Locator) -> String {
    let mut hasher = Sha256::new();
    hasher.update(locator.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of everything besides content that shapes the output: the
/// source tree and the resolver options.
fn fingerprint(resolver: &InclusionResolver) -> String {
    let options = resolver.options();
    let tags = &options.tags;
    let content = format!(
        "{}:{}:{}:{}:{}:{}:{}:{}",
        env!("CARGO_PKG_VERSION"),
        resolver.source().id(),
        options.max_depth,
        options.diagnostics,
        tags.directive,
        tags.fallback,
        tags.escape,
        tags.marker,
    );
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
