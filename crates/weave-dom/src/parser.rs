//! Markup parser producing [`Dom`] documents.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::dom::{Dom, NodeId};
use crate::entities::decode_entity;
use crate::error::DomError;

/// Parse `source` into a new document owned by `dom`.
///
/// The document may hold several top-level elements, which is how partial
/// templates are usually authored. Whitespace between top-level nodes is
/// dropped; everything else (text, comments, CDATA) is kept.
///
/// # Errors
///
/// Returns [`DomError`] on malformed markup or unbalanced tags.
pub fn parse_document(
    dom: &mut Dom,
    uri: impl Into<String>,
    source: &str,
) -> Result<NodeId, DomError> {
    let document = dom.create_document(uri);

    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    let mut open = vec![document];

    loop {
        let current = open.last().copied().unwrap_or(document);
        match reader.read_event()? {
            Event::Start(e) => {
                let element = create_element(dom, &reader, document, &e)?;
                dom.append(current, element);
                open.push(element);
            }
            Event::Empty(e) => {
                let element = create_element(dom, &reader, document, &e)?;
                dom.append(current, element);
            }
            Event::End(e) => {
                if open.len() == 1 {
                    let name = decode_name(&reader, e.name().as_ref());
                    return Err(DomError::UnexpectedEnd(name));
                }
                open.pop();
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                push_text(dom, current, document, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                dom.append_text(current, &decode_entity(&entity));
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                dom.append_text(current, &text);
            }
            Event::Comment(e) => {
                let text = reader.decoder().decode(&e)?;
                let comment = dom.create_comment(document, text.into_owned());
                dom.append(current, comment);
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if let Some(&unclosed) = open.last()
        && unclosed != document
    {
        let name = dom.name(unclosed).unwrap_or_default().to_owned();
        return Err(DomError::Unclosed(name));
    }

    Ok(document)
}

/// Top-level whitespace is formatting, not content.
fn push_text(dom: &mut Dom, parent: NodeId, document: NodeId, text: &str) {
    if parent == document && text.trim().is_empty() {
        return;
    }
    dom.append_text(parent, text);
}

fn create_element(
    dom: &mut Dom,
    reader: &Reader<&[u8]>,
    document: NodeId,
    e: &BytesStart,
) -> Result<NodeId, DomError> {
    let element = dom.create_element(document, decode_name(reader, e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr?;
        let key = decode_name(reader, attr.key.as_ref());
        let value = attr
            .unescape_value()
            .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), Cow::into_owned);
        dom.set_attribute(element, &key, value);
    }
    Ok(element)
}

fn decode_name(reader: &Reader<&[u8]>, name: &[u8]) -> String {
    reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        Cow::into_owned,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{NodeKind, to_xml};

    fn parse(source: &str) -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let doc = parse_document(&mut dom, "test.xml", source).unwrap();
        (dom, doc)
    }

    #[test]
    fn test_parse_simple_element() {
        let (dom, doc) = parse("<p>Hello</p>");
        let p = dom.document_element(doc).unwrap();
        assert_eq!(dom.name(p), Some("p"));
        assert_eq!(dom.text_content(p), "Hello");
    }

    #[test]
    fn test_parse_nested_elements() {
        let (dom, doc) = parse("<p><strong>Bold</strong> text</p>");
        let p = dom.document_element(doc).unwrap();
        assert_eq!(dom.children(p).len(), 2);
        let strong = dom.children(p)[0];
        assert_eq!(dom.name(strong), Some("strong"));
        assert_eq!(dom.text(dom.children(p)[1]), Some(" text"));
    }

    #[test]
    fn test_parse_attributes_unescaped() {
        let (dom, doc) = parse(r#"<include href="a&amp;b.xml" xpath="/x"/>"#);
        let el = dom.document_element(doc).unwrap();
        assert_eq!(dom.attribute(el, "href"), Some("a&b.xml"));
        assert_eq!(dom.attribute(el, "xpath"), Some("/x"));
    }

    #[test]
    fn test_parse_multiple_top_level_elements() {
        let (dom, doc) = parse("<frag/>\n<other>X</other>\n");
        let names: Vec<_> = dom
            .children(doc)
            .iter()
            .filter_map(|&c| dom.name(c))
            .collect();
        assert_eq!(names, vec!["frag", "other"]);
        assert_eq!(dom.children(doc).len(), 2);
    }

    #[test]
    fn test_parse_entities_merge_into_text() {
        let (dom, doc) = parse("<p>a &lt; b&nbsp;c</p>");
        let p = dom.document_element(doc).unwrap();
        assert_eq!(dom.children(p).len(), 1);
        assert_eq!(dom.text_content(p), "a < b\u{00a0}c");
    }

    #[test]
    fn test_parse_cdata_and_comment() {
        let (dom, doc) = parse("<p><![CDATA[<raw>]]><!-- note --></p>");
        let p = dom.document_element(doc).unwrap();
        assert_eq!(dom.text_content(p), "<raw>");
        assert_eq!(dom.kind(dom.children(p)[1]), &NodeKind::Comment(" note ".to_owned()));
    }

    #[test]
    fn test_parse_skips_declaration() {
        let (dom, doc) = parse("<?xml version=\"1.0\"?>\n<root/>");
        assert_eq!(to_xml(&dom, doc), "<root/>");
    }

    #[test]
    fn test_parse_unclosed_element_fails() {
        let mut dom = Dom::new();
        let result = parse_document(&mut dom, "bad.xml", "<root><child>");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_mismatched_end_fails() {
        let mut dom = Dom::new();
        let result = parse_document(&mut dom, "bad.xml", "<root></other>");
        assert!(result.is_err());
    }
}
