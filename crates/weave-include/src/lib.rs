//! Inclusion resolver for Weave.
//!
//! Walks a parsed document, finds `<include>` directives, fetches the content
//! they point at, splices it in place and recurses into what was spliced.
//! Every run terminates: recursion is bounded by a maximum depth and cycles
//! are detected from the set of keys currently being resolved.
//!
//! # Directives
//!
//! ```xml
//! <include href="shared/nav.xml" xpath="/nav/ul"/>
//! <include href="notes.txt" parse="text" encoding="utf-8"/>
//! <include xpath="//section[@id='intro']">
//!   <fallback><p>No intro yet.</p></fallback>
//! </include>
//! <literal><include href="shown-verbatim.xml"/></literal>
//! ```
//!
//! Without `href` the selector is evaluated against the directive's own
//! document. Content inside the escape element (`literal`) is never expanded.
//!
//! # Architecture
//!
//! - [`Directive`]: attributes of one directive element, with validation
//! - [`InclusionResolver`]: one resolution run per [`InclusionResolver::load`]
//!   with its own fragment cache, recursion guard and dependency tracker
//! - [`ResolvedDocument`]: the spliced tree, dependencies and diagnostics
//! - [`CachedLoader`]: reuses serialized results across runs while every
//!   dependency is unchanged
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use weave_include::{InclusionResolver, ResolverOptions};
//! use weave_source::{FsSource, Locator};
//!
//! let source = Arc::new(FsSource::new("content".into()));
//! let resolver = InclusionResolver::new(source, ResolverOptions::default());
//! let resolved = resolver.load(&Locator::new("index.xml"))?;
//! println!("{}", resolved.to_xml());
//! ```

mod cache;
mod deps;
mod diagnostics;
mod directive;
mod error;
mod guard;
mod loader;
mod resolver;

pub use cache::{ContentForm, ResolutionCache, ResolutionKey};
pub use deps::DependencyTracker;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use directive::{Directive, ParseMode, TagNames};
pub use error::{IncludeError, LoadError};
pub use guard::RecursionGuard;
pub use loader::{CachedLoader, LoadOutput};
pub use resolver::{DEFAULT_MAX_DEPTH, InclusionResolver, ResolvedDocument, ResolverOptions};
