use std::borrow::Cow;
use std::collections::BTreeMap;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Attribute name to value, as declared on an element.
pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),

    #[error("content is not valid {0}")]
    Encoding(&'static str),

    #[error("no root element")]
    NoRoot,

    #[error("more than one root element")]
    MultipleRoots,

    #[error("text outside of the root element")]
    TextOutsideRoot,

    #[error("unexpected closing tag")]
    UnexpectedEnd,

    #[error("unclosed element <{0}>")]
    Unclosed(String),
}

/// Owned element tree node.
///
/// `text` holds the character data that appears before the first child
/// element, or `None` when there is none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Attributes,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First direct child with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Every element with the given tag in document order, starting with
    /// `self`.
    pub fn iter<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        Descendants { stack: vec![self] }.filter(move |e| e.tag == tag)
    }
}

struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// Decode raw document bytes. A byte order mark takes precedence over the
/// `encoding` of the XML declaration; with neither the content is UTF-8.
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, XmlError> {
    let (encoding, bom_len) = Encoding::for_bom(bytes)
        .or_else(|| declared_encoding(bytes).map(|e| (e, 0)))
        .unwrap_or((UTF_8, 0));
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .ok_or(XmlError::Encoding(encoding.name()))
}

// Unknown labels fall back to UTF-8.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let rest = bytes.strip_prefix(b"<?xml")?;
    let decl = &rest[..rest.windows(2).position(|w| w == b"?>")?];
    let start = decl.windows(8).position(|w| w == b"encoding")? + 8;
    let value = decl[start..]
        .trim_ascii_start()
        .strip_prefix(b"=")?
        .trim_ascii_start();
    let (&quote, value) = value.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = value.iter().position(|&b| b == quote)?;
    Encoding::for_label(&value[..len])
}

/// Parse a whole document and return its root element.
pub fn parse(content: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(open(&e)?),
            Event::Empty(e) => {
                let element = open(&e)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(XmlError::UnexpectedEnd)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(t) => append_text(&mut stack, &t.unescape()?)?,
            Event::CData(c) => append_text(&mut stack, &String::from_utf8_lossy(&c.into_inner()))?,
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.tag));
    }
    root.ok_or(XmlError::NoRoot)
}

fn open(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let mut attributes = Attributes::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }
    Ok(Element {
        tag: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        text: None,
        children: Vec::new(),
    })
}

fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_some() {
        return Err(XmlError::MultipleRoots);
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(current) => {
            // Text after a child element is that child's tail, not ours.
            if current.children.is_empty() {
                current.text.get_or_insert_with(String::new).push_str(text);
            }
        }
        None if !text.trim().is_empty() => return Err(XmlError::TextOutsideRoot),
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let root = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- comment -->
<addon id="x" name="A &amp; B">
  <requires><import addon="xbmc.python" version="2.1.0"/></requires>
  <extension point="one"><provides>video</provides></extension>
</addon>"#,
        )
        .unwrap();
        assert_eq!(root.tag, "addon");
        assert_eq!(root.attr("name"), Some("A & B"));
        assert_eq!(root.children.len(), 2);
        let import = &root.find("requires").unwrap().children[0];
        assert_eq!(import.attr("version"), Some("2.1.0"));
        let provides = root.find("extension").unwrap().find("provides").unwrap();
        assert_eq!(provides.text.as_deref(), Some("video"));
    }

    #[test]
    fn test_text_excludes_tail() {
        let root = parse("<a>head<b>inner</b>tail</a>").unwrap();
        assert_eq!(root.text.as_deref(), Some("head"));
        assert_eq!(root.children[0].text.as_deref(), Some("inner"));
    }

    #[test]
    fn test_empty_element_has_no_text() {
        let root = parse("<a><b/></a>").unwrap();
        assert_eq!(root.children[0].text, None);
    }

    #[test]
    fn test_cdata_text() {
        let root = parse("<a><![CDATA[<b>bold</b>]]></a>").unwrap();
        assert_eq!(root.text.as_deref(), Some("<b>bold</b>"));
    }

    #[test]
    fn test_iter_is_document_order() {
        let root = parse(
            r#"<r><x n="1"><x n="2"/></x><y><x n="3"/></y><x n="4"/></r>"#,
        )
        .unwrap();
        let order: Vec<&str> = root.iter("x").filter_map(|e| e.attr("n")).collect();
        assert_eq!(order, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_iter_includes_self() {
        let root = parse("<x><x/></x>").unwrap();
        assert_eq!(root.iter("x").count(), 2);
    }

    #[test]
    fn test_decode_declared_latin1() {
        let bytes = b"<?xml version=\"1.0\" encoding='ISO-8859-1'?><a n=\"Caf\xe9\"/>";
        let root = parse(&decode(bytes).unwrap()).unwrap();
        assert_eq!(root.attr("n"), Some("Caf\u{e9}"));
    }

    #[test]
    fn test_decode_bom_and_default() {
        assert_eq!(decode(b"\xef\xbb\xbf<a/>").unwrap(), "<a/>");
        assert_eq!(decode("<a>\u{e9}</a>".as_bytes()).unwrap(), "<a>\u{e9}</a>");
        let utf16 = [0xff, 0xfe, b'<', 0, b'a', 0, b'/', 0, b'>', 0];
        assert_eq!(decode(&utf16).unwrap(), "<a/>");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode(b"<a n=\"\xff\"/>"),
            Err(XmlError::Encoding("UTF-8"))
        ));
        assert!(decode(b"<?xml version=\"1.0\" encoding=\"bogus\"?><a n=\"\xff\"/>").is_err());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse("").is_err());
        assert!(parse("just text").is_err());
        assert!(parse("<a><b></a>").is_err());
        assert!(parse("<a>").is_err());
        assert!(parse("<a/><b/>").is_err());
        assert!(parse("<a x=1/>").is_err());
    }
}
