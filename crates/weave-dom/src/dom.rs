//! Arena-allocated markup tree.
//!
//! All nodes of every document parsed during a resolution run live in one
//! [`Dom`]. Links are stored as indices, so splicing content never invalidates
//! handles held elsewhere. Detached nodes stay in the arena until the [`Dom`]
//! is dropped.

use std::fmt;

/// Handle to a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name (e.g., `href`, `xml:lang`).
    pub name: String,
    /// Unescaped attribute value.
    pub value: String,
}

impl Attribute {
    /// Create a new attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root, identified by the locator it was loaded from.
    Document {
        /// Locator of the document (path or URI).
        uri: String,
    },
    /// Detached container for content that is about to be spliced.
    Fragment,
    /// Element with qualified name and attributes (keys unique).
    Element {
        /// Qualified element name (may include a prefix).
        name: String,
        /// Attributes in document order.
        attributes: Vec<Attribute>,
    },
    /// Character data.
    Text(String),
    /// Comment content (without delimiters).
    Comment(String),
}

impl NodeKind {
    /// Document and fragment nodes only group their children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Document { .. } | Self::Fragment)
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    /// Owning document node.
    document: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena holding one or more documents.
#[derive(Debug, Default)]
pub struct Dom {
    nodes: Vec<NodeData>,
}

impl Dom {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes allocated so far, including detached ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, kind: NodeKind, document: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            document: document.unwrap_or(id),
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Create a new, empty document node.
    pub fn create_document(&mut self, uri: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Document { uri: uri.into() }, None)
    }

    /// Create a detached element owned by the document of `owner`.
    pub fn create_element(&mut self, owner: NodeId, name: impl Into<String>) -> NodeId {
        let document = self.document_of(owner);
        self.alloc(
            NodeKind::Element {
                name: name.into(),
                attributes: Vec::new(),
            },
            Some(document),
        )
    }

    /// Create a detached text node owned by the document of `owner`.
    pub fn create_text(&mut self, owner: NodeId, text: impl Into<String>) -> NodeId {
        let document = self.document_of(owner);
        self.alloc(NodeKind::Text(text.into()), Some(document))
    }

    /// Create a detached comment owned by the document of `owner`.
    pub fn create_comment(&mut self, owner: NodeId, text: impl Into<String>) -> NodeId {
        let document = self.document_of(owner);
        self.alloc(NodeKind::Comment(text.into()), Some(document))
    }

    /// Create a detached fragment owned by the document of `owner`.
    pub fn create_fragment(&mut self, owner: NodeId) -> NodeId {
        let document = self.document_of(owner);
        self.alloc(NodeKind::Fragment, Some(document))
    }

    // ── Access ───────────────────────────────────────────────────────

    /// Node payload.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    /// Owning document node (a document owns itself).
    #[must_use]
    pub fn document_of(&self, id: NodeId) -> NodeId {
        self.data(id).document
    }

    /// Locator of the document owning `id`.
    #[must_use]
    pub fn uri(&self, id: NodeId) -> &str {
        match self.kind(self.document_of(id)) {
            NodeKind::Document { uri } => uri,
            _ => "",
        }
    }

    /// Parent node, `None` for roots and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    /// Qualified element name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Element name without its namespace prefix.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id)
            .map(|name| name.rsplit_once(':').map_or(name, |(_, local)| local))
    }

    /// Whether `id` is an element with the given local name.
    #[must_use]
    pub fn is_element_named(&self, id: NodeId, local: &str) -> bool {
        self.local_name(id) == Some(local)
    }

    /// Element attributes (empty for non-elements).
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Attribute value by qualified name.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Text of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// First element child of a document.
    #[must_use]
    pub fn document_element(&self, document: NodeId) -> Option<NodeId> {
        self.children(document)
            .iter()
            .copied()
            .find(|&child| matches!(self.kind(child), NodeKind::Element { .. }))
    }

    /// Flattened text of a node and its descendants.
    ///
    /// Comments contribute only when asked for directly.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Text(text) | NodeKind::Comment(text) => text.clone(),
            _ => {
                let mut out = String::new();
                for node in self.descendants(id) {
                    if let NodeKind::Text(text) = self.kind(node) {
                        out.push_str(text);
                    }
                }
                out
            }
        }
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    ///
    /// Returns a snapshot; later mutations do not affect it.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// `id` followed by its descendants in document order.
    #[must_use]
    pub fn descendants_or_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        out.extend(self.descendants(id));
        out
    }

    /// Iterate over the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&node| self.parent(node))
    }

    /// Topmost ancestor of `id` (itself when detached).
    #[must_use]
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Set an attribute, replacing an existing value with the same name.
    ///
    /// Ignored for non-element nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeKind::Element { attributes, .. } = &mut self.data_mut(id).kind {
            let value = value.into();
            match attributes.iter_mut().find(|attr| attr.name == name) {
                Some(attr) => attr.value = value,
                None => attributes.push(Attribute::new(name, value)),
            }
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.data_mut(parent).children.push(child);
        self.data_mut(child).parent = Some(parent);
    }

    /// Append text, merging with a trailing text child when present.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.children(parent).last()
            && let NodeKind::Text(existing) = &mut self.data_mut(last).kind
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text(parent, text);
        self.append(parent, node);
    }

    /// Remove `id` from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.data_mut(id).parent.take() {
            self.data_mut(parent).children.retain(|&child| child != id);
        }
    }

    /// Put `replacement` where `old` is, detaching `old`.
    ///
    /// Returns `false` (and changes nothing) when `old` has no parent.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        self.detach(replacement);
        let Some(position) = self.children(parent).iter().position(|&c| c == old) else {
            return false;
        };
        self.data_mut(parent).children[position] = replacement;
        self.data_mut(replacement).parent = Some(parent);
        self.data_mut(old).parent = None;
        true
    }

    /// Move the children of `container` to where `old` is, detaching `old`.
    ///
    /// Returns `false` (and changes nothing) when `old` has no parent.
    pub fn replace_with_children(&mut self, old: NodeId, container: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        let Some(position) = self.children(parent).iter().position(|&c| c == old) else {
            return false;
        };
        let moved = std::mem::take(&mut self.data_mut(container).children);
        for &child in &moved {
            self.data_mut(child).parent = Some(parent);
        }
        self.data_mut(parent)
            .children
            .splice(position..=position, moved);
        self.data_mut(old).parent = None;
        true
    }

    /// Deep-clone `id` into the document owning `owner`.
    ///
    /// Document nodes cannot be nested, so cloning one yields a fragment
    /// holding copies of its children.
    pub fn import(&mut self, id: NodeId, owner: NodeId) -> NodeId {
        let document = self.document_of(owner);
        let kind = match self.kind(id) {
            NodeKind::Document { .. } => NodeKind::Fragment,
            other => other.clone(),
        };
        let copy = self.alloc(kind, Some(document));
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.import(child, document);
            self.data_mut(child_copy).parent = Some(copy);
            self.data_mut(copy).children.push(child_copy);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> (Dom, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let doc = dom.create_document("a.xml");
        let root = dom.create_element(doc, "root");
        dom.append(doc, root);
        let child = dom.create_element(doc, "child");
        dom.append(root, child);
        dom.append_text(child, "hello");
        (dom, doc, root, child)
    }

    #[test]
    fn test_document_owns_itself() {
        let mut dom = Dom::new();
        let doc = dom.create_document("a.xml");
        assert_eq!(dom.document_of(doc), doc);
        assert_eq!(dom.uri(doc), "a.xml");
    }

    #[test]
    fn test_nodes_record_owner() {
        let (dom, doc, root, child) = sample();
        assert_eq!(dom.document_of(root), doc);
        assert_eq!(dom.document_of(child), doc);
        assert_eq!(dom.uri(child), "a.xml");
    }

    #[test]
    fn test_local_name_strips_prefix() {
        let mut dom = Dom::new();
        let doc = dom.create_document("a.xml");
        let el = dom.create_element(doc, "xi:include");
        assert_eq!(dom.name(el), Some("xi:include"));
        assert_eq!(dom.local_name(el), Some("include"));
        assert!(dom.is_element_named(el, "include"));
    }

    #[test]
    fn test_set_attribute_keeps_keys_unique() {
        let mut dom = Dom::new();
        let doc = dom.create_document("a.xml");
        let el = dom.create_element(doc, "include");
        dom.set_attribute(el, "href", "one");
        dom.set_attribute(el, "href", "two");
        assert_eq!(dom.attributes(el).len(), 1);
        assert_eq!(dom.attribute(el, "href"), Some("two"));
    }

    #[test]
    fn test_append_text_merges() {
        let (mut dom, _, _, child) = sample();
        dom.append_text(child, " world");
        assert_eq!(dom.children(child).len(), 1);
        assert_eq!(dom.text_content(child), "hello world");
    }

    #[test]
    fn test_append_moves_node() {
        let (mut dom, doc, root, child) = sample();
        let other = dom.create_element(doc, "other");
        dom.append(root, other);
        dom.append(other, child);
        assert_eq!(dom.children(root), &[other]);
        assert_eq!(dom.parent(child), Some(other));
    }

    #[test]
    fn test_replace() {
        let (mut dom, doc, root, child) = sample();
        let new = dom.create_element(doc, "new");
        assert!(dom.replace(child, new));
        assert_eq!(dom.children(root), &[new]);
        assert_eq!(dom.parent(child), None);
        assert!(!dom.replace(child, new));
    }

    #[test]
    fn test_replace_with_children() {
        let (mut dom, doc, root, child) = sample();
        let tail = dom.create_element(doc, "tail");
        dom.append(root, tail);

        let fragment = dom.create_fragment(doc);
        let a = dom.create_element(doc, "a");
        let b = dom.create_text(doc, "b");
        dom.append(fragment, a);
        dom.append(fragment, b);

        assert!(dom.replace_with_children(child, fragment));
        assert_eq!(dom.children(root), &[a, b, tail]);
        assert_eq!(dom.parent(a), Some(root));
        assert!(dom.children(fragment).is_empty());
    }

    #[test]
    fn test_import_deep_clones_into_other_document() {
        let (mut dom, _, root, child) = sample();
        let other = dom.create_document("b.xml");
        let copy = dom.import(root, other);

        assert_ne!(copy, root);
        assert_eq!(dom.document_of(copy), other);
        assert_eq!(dom.parent(copy), None);
        assert_eq!(dom.text_content(copy), "hello");
        let copied_child = dom.children(copy)[0];
        assert_ne!(copied_child, child);
        assert_eq!(dom.document_of(copied_child), other);
    }

    #[test]
    fn test_import_document_yields_fragment() {
        let (mut dom, doc, _, _) = sample();
        let other = dom.create_document("b.xml");
        let copy = dom.import(doc, other);
        assert_eq!(dom.kind(copy), &NodeKind::Fragment);
        assert_eq!(dom.children(copy).len(), 1);
    }

    #[test]
    fn test_descendants_document_order() {
        let (mut dom, doc, root, child) = sample();
        let second = dom.create_element(doc, "second");
        dom.append(root, second);
        let text = dom.children(child)[0];
        assert_eq!(dom.descendants(doc), vec![root, child, text, second]);
    }

    #[test]
    fn test_ancestry() {
        let (dom, doc, root, child) = sample();
        assert!(dom.is_ancestor_or_self(root, child));
        assert!(dom.is_ancestor_or_self(child, child));
        assert!(!dom.is_ancestor_or_self(child, root));
        assert_eq!(dom.tree_root(child), doc);
        assert_eq!(dom.document_element(doc), Some(root));
    }
}
