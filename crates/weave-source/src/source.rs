//! Content source trait and error types.
//!
//! Provides the [`ContentSource`] trait through which the resolver reads every
//! external resource, along with [`SourceError`] for unified error handling
//! across backends.

use weave_dom::{Dom, NodeId, parse_document};

use crate::encoding::TextEncoding;
use crate::locator::Locator;

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Locator is malformed or escapes the source root.
    InvalidLocator,
    /// Backend cannot serve this kind of locator (e.g., remote URIs).
    Unsupported,
    /// Content is not valid in the requested encoding.
    Decode,
    /// Structured content could not be parsed.
    Parse,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid locator, malformed content).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
    /// Retry with backoff (service unavailable).
    Persistent,
}

/// Source error with semantic kind and backend-specific cause.
#[derive(Debug)]
pub struct SourceError {
    /// Semantic error category.
    pub kind: SourceErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Locator context (if applicable).
    pub locator: Option<Locator>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    /// Create a new source error.
    #[must_use]
    pub fn new(kind: SourceErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            locator: None,
            backend: None,
            source: None,
        }
    }

    /// Attach locator context.
    #[must_use]
    pub fn with_locator(mut self, locator: &Locator) -> Self {
        self.locator = Some(locator.clone());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Whether the resource simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == SourceErrorKind::NotFound
    }

    /// Create a not found error for a locator.
    #[must_use]
    pub fn not_found(locator: &Locator) -> Self {
        Self::new(SourceErrorKind::NotFound).with_locator(locator)
    }

    /// Create a source error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, locator: &Locator) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => SourceErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => SourceErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => SourceErrorKind::Timeout,
            std::io::ErrorKind::InvalidInput => SourceErrorKind::InvalidLocator,
            _ => SourceErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => {
                ErrorStatus::Temporary
            }
            _ => ErrorStatus::Permanent,
        };
        Self::new(kind)
            .with_status(status)
            .with_locator(locator)
            .with_source(err)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (locator: a/b.xml)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            SourceErrorKind::NotFound => "Not found",
            SourceErrorKind::PermissionDenied => "Permission denied",
            SourceErrorKind::InvalidLocator => "Invalid locator",
            SourceErrorKind::Unsupported => "Unsupported locator",
            SourceErrorKind::Decode => "Decode error",
            SourceErrorKind::Parse => "Parse error",
            SourceErrorKind::Unavailable => "Unavailable",
            SourceErrorKind::Timeout => "Timeout",
            SourceErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(locator) = &self.locator {
            write!(f, " (locator: {locator})")?;
        }

        Ok(())
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result of fetching and parsing a structured resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredFetch {
    /// Document node of the parsed tree.
    pub document: NodeId,
    /// Every locator read while producing the tree (at least the fetched one).
    pub dependencies: Vec<Locator>,
}

/// Access to external content.
///
/// Implementations must be shareable across threads: independent resolution
/// runs may use one source concurrently.
pub trait ContentSource: Send + Sync {
    /// Read the raw bytes of a resource.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] with [`SourceErrorKind::NotFound`] when the
    /// resource does not exist, or another kind when it cannot be read.
    fn read(&self, locator: &Locator) -> Result<Vec<u8>, SourceError>;

    /// Get modification time as seconds since Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the resource doesn't exist or its mtime
    /// can't be retrieved.
    fn mtime(&self, locator: &Locator) -> Result<f64, SourceError>;

    /// Identity of the content tree this source reads from.
    ///
    /// Two sources with the same id must map every locator to the same
    /// resource. Results cached across runs are keyed on it.
    fn id(&self) -> String {
        std::any::type_name::<Self>().to_owned()
    }

    /// Fetch a resource as text in the given encoding.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when reading fails or the content is not valid
    /// in `encoding` ([`SourceErrorKind::Decode`]).
    fn fetch_text(&self, locator: &Locator, encoding: TextEncoding) -> Result<String, SourceError> {
        let bytes = self.read(locator)?;
        encoding.decode(&bytes).map_err(|e| {
            SourceError::new(SourceErrorKind::Decode)
                .with_locator(locator)
                .with_source(e)
        })
    }

    /// Fetch and parse a structured resource into `dom`.
    ///
    /// Structured content is always decoded as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when reading fails, the content is not UTF-8, or
    /// the markup is malformed ([`SourceErrorKind::Parse`]).
    fn fetch_structured(
        &self,
        locator: &Locator,
        dom: &mut Dom,
    ) -> Result<StructuredFetch, SourceError> {
        let text = self.fetch_text(locator, TextEncoding::Utf8)?;
        let document = parse_document(dom, locator.as_str(), &text).map_err(|e| {
            SourceError::new(SourceErrorKind::Parse)
                .with_locator(locator)
                .with_source(e)
        })?;
        Ok(StructuredFetch {
            document,
            dependencies: vec![locator.clone()],
        })
    }
}
