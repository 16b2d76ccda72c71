//! Mock content source for testing.
//!
//! Provides [`MockSource`] for unit testing without filesystem access.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::locator::Locator;
use crate::source::{ContentSource, SourceError, SourceErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// In-memory content source for testing.
///
/// Stores content in memory and counts reads per locator, so tests can
/// assert how often the resolver went back to the source.
///
/// # Example
///
/// ```ignore
/// use weave_source::{ContentSource, Locator, MockSource};
///
/// let source = MockSource::new()
///     .with_content("nav.xml", "<nav/>")
///     .with_mtime("nav.xml", 1_700_000_000.0);
///
/// let bytes = source.read(&Locator::new("nav.xml")).unwrap();
/// assert_eq!(source.read_count("nav.xml"), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    contents: RwLock<HashMap<Locator, Vec<u8>>>,
    mtimes: RwLock<HashMap<Locator, f64>>,
    failures: RwLock<HashMap<Locator, SourceErrorKind>>,
    reads: RwLock<HashMap<Locator, usize>>,
}

impl MockSource {
    /// Create a new empty mock source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add text content for a locator.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_content(self, locator: impl Into<Locator>, content: impl Into<String>) -> Self {
        self.set_content(locator, content);
        self
    }

    /// Add raw bytes for a locator.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_bytes(self, locator: impl Into<Locator>, bytes: impl Into<Vec<u8>>) -> Self {
        self.contents
            .write()
            .unwrap()
            .insert(locator.into(), bytes.into());
        self
    }

    /// Set modification time for a locator.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_mtime(self, locator: impl Into<Locator>, mtime: f64) -> Self {
        self.set_mtime(locator, mtime);
        self
    }

    /// Make every read of a locator fail with `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, locator: impl Into<Locator>, kind: SourceErrorKind) -> Self {
        self.failures.write().unwrap().insert(locator.into(), kind);
        self
    }

    /// Replace content after construction.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_content(&self, locator: impl Into<Locator>, content: impl Into<String>) {
        self.contents
            .write()
            .unwrap()
            .insert(locator.into(), content.into().into_bytes());
    }

    /// Replace the modification time after construction.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_mtime(&self, locator: impl Into<Locator>, mtime: f64) {
        self.mtimes.write().unwrap().insert(locator.into(), mtime);
    }

    /// Remove content, so later reads report not found.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove(&self, locator: impl Into<Locator>) {
        let locator = locator.into();
        self.contents.write().unwrap().remove(&locator);
        self.mtimes.write().unwrap().remove(&locator);
    }

    /// Number of `read` calls made for a locator, including failed ones.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn read_count(&self, locator: impl Into<Locator>) -> usize {
        self.reads
            .read()
            .unwrap()
            .get(&locator.into())
            .copied()
            .unwrap_or(0)
    }

    /// Total number of `read` calls across all locators.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn total_reads(&self) -> usize {
        self.reads.read().unwrap().values().sum()
    }
}

impl ContentSource for MockSource {
    fn read(&self, locator: &Locator) -> Result<Vec<u8>, SourceError> {
        *self
            .reads
            .write()
            .unwrap()
            .entry(locator.clone())
            .or_insert(0) += 1;

        if let Some(&kind) = self.failures.read().unwrap().get(locator) {
            return Err(SourceError::new(kind)
                .with_locator(locator)
                .with_backend(BACKEND));
        }

        self.contents
            .read()
            .unwrap()
            .get(locator)
            .cloned()
            .ok_or_else(|| SourceError::not_found(locator).with_backend(BACKEND))
    }

    fn mtime(&self, locator: &Locator) -> Result<f64, SourceError> {
        if !self.contents.read().unwrap().contains_key(locator) {
            return Err(SourceError::not_found(locator).with_backend(BACKEND));
        }
        Ok(self
            .mtimes
            .read()
            .unwrap()
            .get(locator)
            .copied()
            .unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextEncoding;

    #[test]
    fn test_read_counts_calls() {
        let source = MockSource::new().with_content("a.xml", "<a/>");
        let locator = Locator::new("a.xml");

        source.read(&locator).unwrap();
        source.read(&locator).unwrap();
        let _ = source.read(&Locator::new("missing.xml"));

        assert_eq!(source.read_count("a.xml"), 2);
        assert_eq!(source.read_count("missing.xml"), 1);
        assert_eq!(source.total_reads(), 3);
    }

    #[test]
    fn test_missing_content_is_not_found() {
        let source = MockSource::new();
        let err = source.read(&Locator::new("x.xml")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Mock"));
    }

    #[test]
    fn test_with_failure() {
        let source = MockSource::new()
            .with_content("a.xml", "<a/>")
            .with_failure("a.xml", SourceErrorKind::PermissionDenied);
        let err = source.read(&Locator::new("a.xml")).unwrap_err();
        assert_eq!(err.kind, SourceErrorKind::PermissionDenied);
    }

    #[test]
    fn test_mtime_defaults_and_overrides() {
        let source = MockSource::new()
            .with_content("a.xml", "<a/>")
            .with_content("b.xml", "<b/>")
            .with_mtime("b.xml", 42.0);

        assert!((source.mtime(&Locator::new("a.xml")).unwrap() - 0.0).abs() < f64::EPSILON);
        assert!((source.mtime(&Locator::new("b.xml")).unwrap() - 42.0).abs() < f64::EPSILON);
        assert!(source.mtime(&Locator::new("c.xml")).is_err());
    }

    #[test]
    fn test_remove_and_set_content() {
        let source = MockSource::new().with_content("a.xml", "old");
        source.set_content("a.xml", "new");
        assert_eq!(
            source
                .fetch_text(&Locator::new("a.xml"), TextEncoding::Ascii)
                .unwrap(),
            "new"
        );

        source.remove("a.xml");
        assert!(source.read(&Locator::new("a.xml")).is_err());
    }
}
