//! Directive extraction and validation.

use weave_dom::{Dom, NodeId};
use weave_source::TextEncoding;

use crate::error::IncludeError;

/// Selector used when a directive names only an `href`.
pub(crate) const DOCUMENT_SELECTOR: &str = "/";

/// How fetched content is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseMode {
    /// Parse as markup and select a fragment (`parse="xml"`).
    #[default]
    Structured,
    /// Insert as a single text node (`parse="text"`).
    RawText,
}

impl ParseMode {
    /// Look up a mode by its attribute token, case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "xml" => Some(Self::Structured),
            "text" => Some(Self::RawText),
            _ => None,
        }
    }
}

/// Element names that drive directive discovery.
///
/// Names are compared against local names, so `xi:include` matches
/// `include`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNames {
    /// Directive element.
    pub directive: String,
    /// Fallback child of a directive.
    pub fallback: String,
    /// Escape element; nothing inside it is expanded.
    pub escape: String,
    /// Element emitted in place of failed directives in diagnostics mode.
    pub marker: String,
}

impl Default for TagNames {
    fn default() -> Self {
        Self {
            directive: "include".to_owned(),
            fallback: "fallback".to_owned(),
            escape: "literal".to_owned(),
            marker: "include-error".to_owned(),
        }
    }
}

/// A directive element's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The directive element.
    pub element: NodeId,
    /// Referenced resource; `None` targets the directive's own document.
    pub href: Option<String>,
    /// Selector as written (`xpath` or `selector` attribute).
    pub selector: Option<String>,
    /// How to interpret fetched content.
    pub parse_mode: ParseMode,
    /// Encoding for raw text.
    pub encoding: TextEncoding,
    /// First fallback child element.
    pub fallback: Option<NodeId>,
}

impl Directive {
    /// Read a directive from `element`.
    ///
    /// Empty `href` and selector attributes count as absent. Unknown `parse`
    /// and `encoding` values fall back to their defaults.
    #[must_use]
    pub fn extract(dom: &Dom, element: NodeId, tags: &TagNames) -> Self {
        let non_empty = |name: &str| {
            dom.attribute(element, name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };

        let href = non_empty("href");
        let selector = non_empty("xpath").or_else(|| non_empty("selector"));

        let parse_mode = match dom.attribute(element, "parse") {
            None => ParseMode::default(),
            Some(token) => ParseMode::from_token(token).unwrap_or_else(|| {
                tracing::debug!(token, "Unknown parse mode, using xml");
                ParseMode::default()
            }),
        };
        let encoding = match dom.attribute(element, "encoding") {
            None => TextEncoding::default(),
            Some(label) => TextEncoding::from_label(label).unwrap_or_else(|| {
                tracing::debug!(label, "Unknown encoding, using ascii");
                TextEncoding::default()
            }),
        };

        let mut fallbacks = dom
            .children(element)
            .iter()
            .copied()
            .filter(|&child| dom.is_element_named(child, &tags.fallback));
        let fallback = fallbacks.next();
        if fallbacks.next().is_some() {
            tracing::warn!(
                document = dom.uri(element),
                "Include has several fallback elements, using the first"
            );
        }

        Self {
            element,
            href,
            selector,
            parse_mode,
            encoding,
            fallback,
        }
    }

    /// Check that the directive names something to include.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::MissingTarget`] when neither `href` nor a
    /// selector is present.
    pub fn validate(&self) -> Result<(), IncludeError> {
        if self.href.is_none() && self.selector.is_none() {
            return Err(IncludeError::MissingTarget);
        }
        Ok(())
    }

    /// Effective selector (`/` when none was given).
    #[must_use]
    pub fn selector(&self) -> &str {
        self.selector.as_deref().unwrap_or(DOCUMENT_SELECTOR)
    }

    /// Whether the directive targets its own document.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.href.is_none()
    }

    /// Human-readable reference used in logs and diagnostics:
    /// `href`, `href#selector` or `#selector`.
    #[must_use]
    pub fn identity(&self) -> String {
        match (&self.href, &self.selector) {
            (Some(href), Some(selector)) => format!("{href}#{selector}"),
            (Some(href), None) => href.clone(),
            (None, Some(selector)) => format!("#{selector}"),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use weave_dom::parse_document;

    use super::*;

    fn directive(markup: &str) -> Directive {
        let mut dom = Dom::new();
        let doc = parse_document(&mut dom, "page.xml", markup).unwrap();
        let element = dom.document_element(doc).unwrap();
        Directive::extract(&dom, element, &TagNames::default())
    }

    #[test]
    fn test_defaults() {
        let d = directive(r#"<include href="nav.xml"/>"#);
        assert_eq!(d.href.as_deref(), Some("nav.xml"));
        assert_eq!(d.selector(), "/");
        assert_eq!(d.parse_mode, ParseMode::Structured);
        assert_eq!(d.encoding, TextEncoding::Ascii);
        assert!(d.fallback.is_none());
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_xpath_preferred_over_selector() {
        let d = directive(r#"<include xpath="/a" selector="/b"/>"#);
        assert_eq!(d.selector(), "/a");
        assert!(d.is_local());
    }

    #[test]
    fn test_selector_attribute_alias() {
        let d = directive(r#"<include selector="//nav"/>"#);
        assert_eq!(d.selector(), "//nav");
    }

    #[test]
    fn test_tokens_are_case_insensitive() {
        let d = directive(r#"<include href="a.txt" parse="TEXT" encoding="UTF-8"/>"#);
        assert_eq!(d.parse_mode, ParseMode::RawText);
        assert_eq!(d.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_unknown_tokens_use_defaults() {
        let d = directive(r#"<include href="a.txt" parse="html" encoding="latin1"/>"#);
        assert_eq!(d.parse_mode, ParseMode::Structured);
        assert_eq!(d.encoding, TextEncoding::Ascii);
    }

    #[test]
    fn test_missing_target() {
        let d = directive(r#"<include href="" parse="text"/>"#);
        assert_eq!(d.validate(), Err(IncludeError::MissingTarget));
    }

    #[test]
    fn test_identity_forms() {
        assert_eq!(directive(r#"<include href="a.xml"/>"#).identity(), "a.xml");
        assert_eq!(
            directive(r#"<include href="a.xml" xpath="/x"/>"#).identity(),
            "a.xml#/x"
        );
        assert_eq!(directive(r#"<include xpath="/x"/>"#).identity(), "#/x");
    }

    #[test]
    fn test_first_fallback_is_used() {
        let mut dom = Dom::new();
        let doc = parse_document(
            &mut dom,
            "page.xml",
            "<xi:include href=\"a.xml\"><xi:fallback>one</xi:fallback><fallback>two</fallback></xi:include>",
        )
        .unwrap();
        let element = dom.document_element(doc).unwrap();
        let d = Directive::extract(&dom, element, &TagNames::default());

        let fallback = d.fallback.unwrap();
        assert_eq!(dom.text_content(fallback), "one");
    }
}
