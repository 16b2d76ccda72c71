//! Error types for parsing and querying markup.

/// Error while building a tree from markup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DomError {
    /// XML syntax error.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Text could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// End tag without a matching start tag.
    #[error("unexpected end tag </{0}>")]
    UnexpectedEnd(String),

    /// Input ended before an element was closed.
    #[error("unclosed element <{0}>")]
    Unclosed(String),
}

/// Invalid path query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector '{selector}': {reason}")]
pub struct SelectorError {
    /// The selector as written.
    pub selector: String,
    /// What is wrong with it.
    pub reason: String,
}

impl SelectorError {
    pub(crate) fn new(selector: &str, reason: impl Into<String>) -> Self {
        Self {
            selector: selector.to_owned(),
            reason: reason.into(),
        }
    }
}
