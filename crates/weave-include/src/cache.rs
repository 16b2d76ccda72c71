//! Per-run cache of resolved fragments.

use std::collections::{HashMap, HashSet};
use std::fmt;

use weave_dom::NodeId;
use weave_source::{Locator, TextEncoding};

/// Form in which content was included.
///
/// The same file included as markup and as raw text yields different nodes,
/// so the form is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentForm {
    /// Parsed markup.
    Markup,
    /// Raw text in the given encoding.
    Text(TextEncoding),
}

/// Identifies one resolvable fragment: where it lives and how to pick it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    /// Target document.
    pub locator: Locator,
    /// Selector applied to it.
    pub selector: String,
    /// Markup or raw text.
    pub form: ContentForm,
}

impl ResolutionKey {
    /// Key for a markup fragment.
    #[must_use]
    pub fn markup(locator: Locator, selector: impl Into<String>) -> Self {
        Self {
            locator,
            selector: selector.into(),
            form: ContentForm::Markup,
        }
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.locator, self.selector)?;
        if let ContentForm::Text(encoding) = self.form {
            write!(f, " (text, {encoding})")?;
        }
        Ok(())
    }
}

/// Resolved fragments of one run, keyed by [`ResolutionKey`].
///
/// Seeded with the root document so that any directive pointing back at the
/// whole root is recognized as a cycle. Keys whose target turned out to be
/// missing are remembered too, so the source is asked at most once per key.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: HashMap<ResolutionKey, NodeId>,
    missing: HashSet<ResolutionKey>,
}

impl ResolutionCache {
    /// Create a cache holding only the root document.
    #[must_use]
    pub fn new(root: ResolutionKey, document: NodeId) -> Self {
        Self {
            entries: HashMap::from([(root, document)]),
            missing: HashSet::new(),
        }
    }

    /// Node resolved for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &ResolutionKey) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    /// Whether `key` has been resolved (or is being resolved).
    #[must_use]
    pub fn contains(&self, key: &ResolutionKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Record the node for `key`.
    pub fn insert(&mut self, key: ResolutionKey, node: NodeId) {
        self.entries.insert(key, node);
    }

    /// Remember that `key` selected nothing.
    pub fn insert_missing(&mut self, key: ResolutionKey) {
        self.missing.insert(key);
    }

    /// Whether `key` is known to select nothing.
    #[must_use]
    pub fn is_missing(&self, key: &ResolutionKey) -> bool {
        self.missing.contains(key)
    }

    /// Number of cached fragments, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use weave_dom::Dom;

    use super::*;

    #[test]
    fn test_seeded_with_root() {
        let mut dom = Dom::new();
        let doc = dom.create_document("index.xml");
        let root = ResolutionKey::markup(Locator::new("index.xml"), "/");

        let cache = ResolutionCache::new(root.clone(), doc);

        assert_eq!(cache.get(&root), Some(doc));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_form_is_part_of_key() {
        let mut dom = Dom::new();
        let doc = dom.create_document("index.xml");
        let locator = Locator::new("notes.txt");
        let mut cache = ResolutionCache::new(ResolutionKey::markup(Locator::new("index.xml"), "/"), doc);

        cache.insert(ResolutionKey::markup(locator.clone(), "/"), doc);

        let text_key = ResolutionKey {
            locator,
            selector: "/".to_owned(),
            form: ContentForm::Text(TextEncoding::Utf8),
        };
        assert!(!cache.contains(&text_key));
        assert_eq!(text_key.to_string(), "notes.txt#/ (text, utf-8)");
    }

    #[test]
    fn test_missing_keys_are_not_fragments() {
        let mut dom = Dom::new();
        let doc = dom.create_document("index.xml");
        let mut cache = ResolutionCache::new(ResolutionKey::markup(Locator::new("index.xml"), "/"), doc);
        let key = ResolutionKey::markup(Locator::new("parts.xml"), "/none");

        cache.insert_missing(key.clone());

        assert!(cache.is_missing(&key));
        assert!(!cache.contains(&key));
        assert_eq!(cache.len(), 1);
    }
}
