//! Filesystem content source.
//!
//! Provides [`FsSource`] for reading content from a local directory.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::locator::Locator;
use crate::source::{ContentSource, SourceError, SourceErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem content source.
///
/// Locators are paths relative to the root directory. Rooted locators
/// (`/shared/nav.xml`) are taken relative to the same root, so content can
/// never be read from outside it.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use weave_source::{ContentSource, FsSource, Locator};
///
/// let source = FsSource::new(PathBuf::from("content"));
/// let bytes = source.read(&Locator::new("pages/index.xml"))?;
/// ```
#[derive(Debug, Clone)]
pub struct FsSource {
    /// Root directory for content.
    root: PathBuf,
}

impl FsSource {
    /// Create a source rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a locator to a file path under the root.
    ///
    /// Rejects remote locators and paths containing parent directory
    /// components (`..`), which could otherwise escape the root.
    fn file_path(&self, locator: &Locator) -> Result<PathBuf, SourceError> {
        if locator.is_remote() {
            return Err(SourceError::new(SourceErrorKind::Unsupported)
                .with_locator(locator)
                .with_backend(BACKEND));
        }

        let relative = Path::new(locator.as_str().trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(SourceError::new(SourceErrorKind::InvalidLocator)
                .with_locator(locator)
                .with_backend(BACKEND));
        }

        Ok(self.root.join(relative))
    }
}

impl ContentSource for FsSource {
    fn read(&self, locator: &Locator) -> Result<Vec<u8>, SourceError> {
        let path = self.file_path(locator)?;
        tracing::debug!(locator = %locator, path = %path.display(), "Reading content");
        fs::read(&path).map_err(|e| SourceError::io(e, locator).with_backend(BACKEND))
    }

    fn mtime(&self, locator: &Locator) -> Result<f64, SourceError> {
        let path = self.file_path(locator)?;
        let metadata =
            fs::metadata(&path).map_err(|e| SourceError::io(e, locator).with_backend(BACKEND))?;
        let modified = metadata
            .modified()
            .map_err(|e| SourceError::io(e, locator).with_backend(BACKEND))?;
        Ok(modified
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64()))
    }

    fn id(&self) -> String {
        format!("fs:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use weave_dom::{Dom, to_xml};

    use super::*;
    use crate::TextEncoding;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_fs_source_is_send_sync() {
        assert_send_sync::<FsSource>();
    }

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_id_names_root() {
        let a = FsSource::new(PathBuf::from("/srv/a"));
        let b = FsSource::new(PathBuf::from("/srv/b"));

        assert_eq!(a.id(), "fs:/srv/a");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_read_nested_file() {
        let temp_dir = create_test_dir();
        let pages = temp_dir.path().join("pages");
        fs::create_dir(&pages).unwrap();
        fs::write(pages.join("nav.xml"), "<nav/>").unwrap();

        let source = FsSource::new(temp_dir.path().to_path_buf());
        let bytes = source.read(&Locator::new("pages/nav.xml")).unwrap();

        assert_eq!(bytes, b"<nav/>");
    }

    #[test]
    fn test_rooted_locator_stays_under_root() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("nav.xml"), "<nav/>").unwrap();

        let source = FsSource::new(temp_dir.path().to_path_buf());

        assert_eq!(source.read(&Locator::new("/nav.xml")).unwrap(), b"<nav/>");
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = create_test_dir();

        let source = FsSource::new(temp_dir.path().to_path_buf());
        let err = source.read(&Locator::new("missing.xml")).unwrap_err();

        assert_eq!(err.kind, SourceErrorKind::NotFound);
        assert_eq!(err.backend, Some("Fs"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let temp_dir = create_test_dir();

        let source = FsSource::new(temp_dir.path().join("content"));
        let err = source.read(&Locator::new("../secret.xml")).unwrap_err();

        assert_eq!(err.kind, SourceErrorKind::InvalidLocator);
    }

    #[test]
    fn test_remote_locator_unsupported() {
        let temp_dir = create_test_dir();

        let source = FsSource::new(temp_dir.path().to_path_buf());
        let err = source
            .read(&Locator::new("https://example.com/a.xml"))
            .unwrap_err();

        assert_eq!(err.kind, SourceErrorKind::Unsupported);
    }

    #[test]
    fn test_mtime_existing_file() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("a.xml"), "<a/>").unwrap();

        let source = FsSource::new(temp_dir.path().to_path_buf());
        let mtime = source.mtime(&Locator::new("a.xml")).unwrap();

        assert!(mtime > 0.0);
    }

    #[test]
    fn test_mtime_missing_file() {
        let temp_dir = create_test_dir();

        let source = FsSource::new(temp_dir.path().to_path_buf());
        let err = source.mtime(&Locator::new("missing.xml")).unwrap_err();

        assert_eq!(err.kind, SourceErrorKind::NotFound);
    }

    #[test]
    fn test_fetch_structured_from_disk() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("page.xml"), "<page>Hi</page>").unwrap();

        let source = FsSource::new(temp_dir.path().to_path_buf());
        let mut dom = Dom::new();
        let fetched = source
            .fetch_structured(&Locator::new("page.xml"), &mut dom)
            .unwrap();

        assert_eq!(to_xml(&dom, fetched.document), "<page>Hi</page>");
    }

    #[test]
    fn test_fetch_text_ascii_from_disk() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("notes.txt"), "plain <text>").unwrap();

        let source = FsSource::new(temp_dir.path().to_path_buf());
        let text = source
            .fetch_text(&Locator::new("notes.txt"), TextEncoding::Ascii)
            .unwrap();

        assert_eq!(text, "plain <text>");
    }
}
