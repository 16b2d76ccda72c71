//! Markup tree for the Weave inclusion resolver.
//!
//! Documents are parsed into a single arena ([`Dom`]) and addressed through
//! lightweight [`NodeId`] handles. Several documents can live in the same
//! arena at once, which lets the resolver move content between them by
//! deep-cloning nodes instead of rewriting parent pointers across trees.
//!
//! # Architecture
//!
//! - [`Dom`]: arena with creation, navigation and splicing operations
//! - [`parse_document`]: quick-xml based parser producing a document node
//! - [`to_xml`]: serializer for any node (documents serialize their children)
//! - [`Selector`]: path-query evaluator (an XPath subset) used to pick the
//!   fragment a directive refers to
//!
//! # Example
//!
//! ```ignore
//! use weave_dom::{Dom, Selector, parse_document, to_xml};
//!
//! let mut dom = Dom::new();
//! let doc = parse_document(&mut dom, "page.xml", "<page><title>Hi</title></page>")?;
//! let title = Selector::parse("/page/title")?.select_first(&dom, doc);
//! assert_eq!(to_xml(&dom, title.unwrap()), "<title>Hi</title>");
//! ```

mod dom;
mod entities;
mod error;
mod parser;
mod selector;
mod serializer;

pub use dom::{Attribute, Dom, NodeId, NodeKind};
pub use error::{DomError, SelectorError};
pub use parser::parse_document;
pub use selector::Selector;
pub use serializer::to_xml;
