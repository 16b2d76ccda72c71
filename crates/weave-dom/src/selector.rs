//! Path queries over a [`Dom`].
//!
//! Supports the subset of XPath that inclusion directives use in practice:
//!
//! - `/` - the document itself
//! - `/a/b`, `a/b`, `./a` - child steps (absolute or relative to the context)
//! - `//a`, `a//b` - descendant steps
//! - `*`, `text()`, `comment()`, `node()` - node tests
//! - `[2]`, `[@id]`, `[@id='main']` - positional and attribute predicates
//!
//! Results are returned in document order without duplicates.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::dom::{Dom, NodeId, NodeKind};
use crate::error::SelectorError;

/// Compiled path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(String),
    AnyElement,
    Text,
    Comment,
    AnyNode,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    HasAttribute(String),
    AttributeEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

impl Selector {
    /// Compile a selector.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] when the selector is empty or uses syntax
    /// outside the supported subset.
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::new(selector, "empty selector"));
        }

        let absolute = trimmed.starts_with('/');
        let (mut axis, mut rest) = split_axis(trimmed);
        if rest.is_empty() {
            if absolute && axis == Axis::Child {
                return Ok(Self {
                    source: trimmed.to_owned(),
                    absolute,
                    steps: Vec::new(),
                });
            }
            return Err(SelectorError::new(selector, "expected a step after '//'"));
        }

        let mut steps = Vec::new();
        loop {
            let (step, remaining) = parse_step(selector, rest, axis)?;
            steps.push(step);
            if remaining.is_empty() {
                break;
            }
            if !remaining.starts_with('/') {
                return Err(SelectorError::new(
                    selector,
                    format!("unexpected '{remaining}'"),
                ));
            }
            (axis, rest) = split_axis(remaining);
            if rest.is_empty() {
                return Err(SelectorError::new(selector, "trailing '/'"));
            }
        }

        Ok(Self {
            source: trimmed.to_owned(),
            absolute,
            steps,
        })
    }

    /// The selector as written (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the selector is `/`, i.e. the whole document.
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.absolute && self.steps.is_empty()
    }

    /// Evaluate against `context`.
    ///
    /// Absolute selectors start from the document owning `context`.
    #[must_use]
    pub fn select(&self, dom: &Dom, context: NodeId) -> Vec<NodeId> {
        let start = if self.absolute {
            dom.document_of(context)
        } else {
            context
        };

        let mut current = vec![start];
        for step in &self.steps {
            let mut next = Vec::new();
            for &node in &current {
                step.collect(dom, node, &mut next);
            }
            current = document_order(dom, next);
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// First match in document order.
    #[must_use]
    pub fn select_first(&self, dom: &Dom, context: NodeId) -> Option<NodeId> {
        self.select(dom, context).into_iter().next()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Step {
    fn collect(&self, dom: &Dom, context: NodeId, out: &mut Vec<NodeId>) {
        if self.test == NodeTest::Context {
            out.extend(self.filter(dom, vec![context]));
            return;
        }
        match self.axis {
            Axis::Child => out.extend(self.filter(dom, dom.children(context).to_vec())),
            Axis::Descendant => {
                // Predicates are positional per parent, as in XPath's `//a[1]`.
                for parent in dom.descendants_or_self(context) {
                    out.extend(self.filter(dom, dom.children(parent).to_vec()));
                }
            }
        }
    }

    fn filter(&self, dom: &Dom, candidates: Vec<NodeId>) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = candidates
            .into_iter()
            .filter(|&node| self.test.matches(dom, node))
            .collect();
        for predicate in &self.predicates {
            nodes = predicate.apply(dom, nodes);
        }
        nodes
    }
}

impl NodeTest {
    fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        match (self, dom.kind(node)) {
            (Self::Name(wanted), NodeKind::Element { name, .. }) => {
                name == wanted
                    || (!wanted.contains(':') && dom.local_name(node) == Some(wanted.as_str()))
            }
            (Self::AnyElement, NodeKind::Element { .. })
            | (Self::Text, NodeKind::Text(_))
            | (Self::Comment, NodeKind::Comment(_))
            | (Self::Context, _) => true,
            (Self::AnyNode, kind) => !kind.is_container(),
            _ => false,
        }
    }
}

impl Predicate {
    fn apply(&self, dom: &Dom, nodes: Vec<NodeId>) -> Vec<NodeId> {
        match self {
            Self::Position(position) => nodes.get(position - 1).copied().into_iter().collect(),
            Self::HasAttribute(name) => nodes
                .into_iter()
                .filter(|&node| dom.attribute(node, name).is_some())
                .collect(),
            Self::AttributeEquals(name, value) => nodes
                .into_iter()
                .filter(|&node| dom.attribute(node, name) == Some(value.as_str()))
                .collect(),
        }
    }
}

fn split_axis(input: &str) -> (Axis, &str) {
    if let Some(rest) = input.strip_prefix("//") {
        (Axis::Descendant, rest)
    } else {
        (Axis::Child, input.strip_prefix('/').unwrap_or(input))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn parse_step<'a>(
    selector: &str,
    input: &'a str,
    axis: Axis,
) -> Result<(Step, &'a str), SelectorError> {
    let (token, mut rest) = if let Some(rest) = input.strip_prefix('*') {
        ("*", rest)
    } else {
        let end = input.find(|c: char| !is_name_char(c)).unwrap_or(input.len());
        input.split_at(end)
    };

    let test = match token {
        "" => {
            return Err(SelectorError::new(
                selector,
                format!("expected a name at '{input}'"),
            ));
        }
        "*" => NodeTest::AnyElement,
        "." => NodeTest::Context,
        "text" | "comment" | "node" if rest.starts_with("()") => {
            rest = &rest[2..];
            match token {
                "text" => NodeTest::Text,
                "comment" => NodeTest::Comment,
                _ => NodeTest::AnyNode,
            }
        }
        name if name.starts_with(|c: char| c.is_alphabetic() || c == '_') => {
            NodeTest::Name(name.to_owned())
        }
        other => {
            return Err(SelectorError::new(
                selector,
                format!("unsupported step '{other}'"),
            ));
        }
    };

    let mut predicates = Vec::new();
    while let Some(body) = rest.strip_prefix('[') {
        let close = find_closing_bracket(body)
            .ok_or_else(|| SelectorError::new(selector, "unterminated predicate"))?;
        predicates.push(parse_predicate(selector, &body[..close])?);
        rest = &body[close + 1..];
    }

    Ok((
        Step {
            axis,
            test,
            predicates,
        },
        rest,
    ))
}

/// Position of the `]` closing a predicate, skipping quoted strings.
fn find_closing_bracket(body: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_predicate(selector: &str, body: &str) -> Result<Predicate, SelectorError> {
    let body = body.trim();

    if let Ok(position) = body.parse::<usize>() {
        if position == 0 {
            return Err(SelectorError::new(selector, "positions start at 1"));
        }
        return Ok(Predicate::Position(position));
    }

    let Some(attr) = body.strip_prefix('@') else {
        return Err(SelectorError::new(
            selector,
            format!("unsupported predicate '[{body}]'"),
        ));
    };

    match attr.split_once('=') {
        None => Ok(Predicate::HasAttribute(attr.trim().to_owned())),
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .ok_or_else(|| {
                    SelectorError::new(selector, format!("attribute value must be quoted: {value}"))
                })?;
            Ok(Predicate::AttributeEquals(
                name.trim().to_owned(),
                unquoted.to_owned(),
            ))
        }
    }
}

/// Deduplicate and sort nodes by their position in the tree.
fn document_order(dom: &Dom, nodes: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    let mut unique: Vec<NodeId> = nodes.into_iter().filter(|n| seen.insert(*n)).collect();
    if unique.len() > 1 {
        let root = dom.tree_root(unique[0]);
        let positions: HashMap<NodeId, usize> = dom
            .descendants_or_self(root)
            .into_iter()
            .enumerate()
            .map(|(i, node)| (node, i))
            .collect();
        unique.sort_by_key(|node| positions.get(node).copied().unwrap_or(usize::MAX));
    }
    unique
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{parse_document, to_xml};

    const SAMPLE: &str = r#"<site><nav id="main"><a>one</a><a>two</a></nav><section><nav><a>three</a></nav></section></site>"#;

    fn select(source: &str, selector: &str) -> Vec<String> {
        let mut dom = Dom::new();
        let doc = parse_document(&mut dom, "sample.xml", source).unwrap();
        Selector::parse(selector)
            .unwrap()
            .select(&dom, doc)
            .into_iter()
            .map(|node| to_xml(&dom, node))
            .collect()
    }

    #[test]
    fn test_root_selects_document() {
        let mut dom = Dom::new();
        let doc = parse_document(&mut dom, "sample.xml", SAMPLE).unwrap();
        let selector = Selector::parse("/").unwrap();
        assert!(selector.is_document());
        assert_eq!(selector.select(&dom, doc), vec![doc]);
    }

    #[test]
    fn test_child_path() {
        assert_eq!(
            select(SAMPLE, "/site/nav/a"),
            vec!["<a>one</a>", "<a>two</a>"]
        );
    }

    #[test]
    fn test_relative_path_from_document() {
        assert_eq!(select(SAMPLE, "site/section/nav/a"), vec!["<a>three</a>"]);
    }

    #[test]
    fn test_descendant_path() {
        assert_eq!(
            select(SAMPLE, "//a"),
            vec!["<a>one</a>", "<a>two</a>", "<a>three</a>"]
        );
    }

    #[test]
    fn test_positional_predicate_is_per_parent() {
        assert_eq!(select(SAMPLE, "//a[1]"), vec!["<a>one</a>", "<a>three</a>"]);
        assert_eq!(select(SAMPLE, "/site/nav/a[2]"), vec!["<a>two</a>"]);
    }

    #[test]
    fn test_attribute_predicates() {
        assert_eq!(select(SAMPLE, "//nav[@id='main']/a[2]"), vec!["<a>two</a>"]);
        assert_eq!(select(SAMPLE, "//nav[@id]").len(), 1);
        assert!(select(SAMPLE, "//nav[@id=\"other\"]").is_empty());
    }

    #[test]
    fn test_wildcard_and_text() {
        assert_eq!(select(SAMPLE, "/site/*").len(), 2);
        assert_eq!(select(SAMPLE, "/site/nav/a/text()"), vec!["one", "two"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(select(SAMPLE, "/missing").is_empty());
        assert!(select(SAMPLE, "/nav").is_empty());
    }

    #[test]
    fn test_local_name_matches_prefixed_elements() {
        assert_eq!(
            select("<x:root><x:item/></x:root>", "/root/item"),
            vec!["<x:item/>"]
        );
    }

    #[test]
    fn test_top_level_fragments() {
        assert_eq!(
            select("<frag>a</frag><other>X</other>", "/other"),
            vec!["<other>X</other>"]
        );
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "//", "/a/", "/a[", "/a[0]", "/a[@b=c]", "/a[last()]", "/..", "/a b"] {
            assert!(Selector::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_quoted_bracket_in_predicate() {
        assert_eq!(
            select(r#"<r><a k="x]y"/></r>"#, "/r/a[@k='x]y']"),
            vec![r#"<a k="x]y"/>"#]
        );
    }
}
