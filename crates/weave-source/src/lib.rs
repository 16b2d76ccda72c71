//! Content sources for the Weave inclusion resolver.
//!
//! The resolver never touches the filesystem or network directly. Every
//! external read goes through the [`ContentSource`] trait, which keeps the
//! resolver testable and lets hosts plug in their own backends.
//!
//! # Architecture
//!
//! - [`Locator`]: normalized reference to a resource (relative path, rooted
//!   path or URI) with relative-reference resolution
//! - [`ContentSource`]: `read()` and `mtime()` plus default `fetch_text()` and
//!   `fetch_structured()` built on top of them
//! - [`FsSource`]: filesystem backend rooted at a content directory
//! - [`MockSource`]: in-memory backend with read counters (behind `mock` feature)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use weave_source::{ContentSource, FsSource, Locator, TextEncoding};
//!
//! let source = FsSource::new(PathBuf::from("content"));
//! let text = source.fetch_text(&Locator::new("notes.txt"), TextEncoding::Utf8)?;
//! ```

mod encoding;
mod fs;
mod locator;
#[cfg(feature = "mock")]
mod mock;
mod source;

pub use encoding::{DecodeError, TextEncoding};
pub use fs::FsSource;
pub use locator::Locator;
#[cfg(feature = "mock")]
pub use mock::MockSource;
pub use source::{ContentSource, ErrorStatus, SourceError, SourceErrorKind, StructuredFetch};
