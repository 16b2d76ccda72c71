//! Markup serializer.

use crate::dom::{Dom, NodeId, NodeKind};

/// Serialize a node and its subtree.
///
/// Documents and fragments serialize as the concatenation of their children.
#[must_use]
pub fn to_xml(dom: &Dom, node: NodeId) -> String {
    let mut out = String::with_capacity(1024);
    serialize_node(dom, node, &mut out);
    out
}

fn serialize_node(dom: &Dom, node: NodeId, out: &mut String) {
    match dom.kind(node) {
        NodeKind::Document { .. } | NodeKind::Fragment => {
            for &child in dom.children(node) {
                serialize_node(dom, child, out);
            }
        }
        NodeKind::Element { name, attributes } => {
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&escape_attr(&attr.value));
                out.push('"');
            }

            let children = dom.children(node);
            if children.is_empty() {
                out.push_str("/>");
                return;
            }

            out.push('>');
            for &child in children {
                serialize_node(dom, child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn escape_text(text: &str) -> String {
    escape_xml(text, false)
}

fn escape_attr(text: &str) -> String {
    escape_xml(text, true)
}

fn escape_xml(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parse_document;

    fn roundtrip(source: &str) -> String {
        let mut dom = Dom::new();
        let doc = parse_document(&mut dom, "test.xml", source).unwrap();
        to_xml(&dom, doc)
    }

    #[test]
    fn test_serialize_nested_with_attributes() {
        let xml = r#"<page id="home"><title>Hi</title><body class="x">Text</body></page>"#;
        assert_eq!(roundtrip(xml), xml);
    }

    #[test]
    fn test_serialize_self_closing() {
        assert_eq!(roundtrip("<p>Before<br></br>After</p>"), "<p>Before<br/>After</p>");
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(
            roundtrip("<p a=\"&quot;q&quot;\">a &lt; b &amp; c &gt; d</p>"),
            "<p a=\"&quot;q&quot;\">a &lt; b &amp; c &gt; d</p>"
        );
    }

    #[test]
    fn test_serialize_comment() {
        assert_eq!(roundtrip("<p><!--keep--></p>"), "<p><!--keep--></p>");
    }

    #[test]
    fn test_serialize_fragment_concatenates_children() {
        let mut dom = Dom::new();
        let doc = dom.create_document("a.xml");
        let fragment = dom.create_fragment(doc);
        let a = dom.create_element(doc, "a");
        dom.append(fragment, a);
        let text = dom.create_text(doc, "tail");
        dom.append(fragment, text);
        assert_eq!(to_xml(&dom, fragment), "<a/>tail");
    }
}
