//! Minimal owned XML tree for package parts
//!
//! Package parts are small enough to hold in memory, and editing them as a tree keeps
//! insertions (comment markers, new paragraphs) local to the element being changed.
//! Element and attribute names are kept as qualified strings (`w:p`, `w:id`); no
//! namespace resolution is performed.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{xml_err, DocxError};

/// Deepest element nesting accepted by [`XmlDocument::parse`]. Serializing and dropping
/// the tree recurse once per level.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    /// Declarations, comments, processing instructions and CDATA, re-emitted verbatim
    Other(Event<'static>),
}

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(XmlNode::Text(text.to_string()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((key.to_string(), value.to_string())),
        }
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Direct child elements, skipping text and other nodes
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.name == name)
    }

    /// Index into `children` of the first child element with this name
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.name == name))
    }

    /// Collect every descendant element with this name, depth-first
    pub fn descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for el in self.elements() {
            if el.name == name {
                out.push(el);
            }
            el.descendants(name, out);
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, DocxError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_err)?.into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
        })
    }
}

/// A parsed XML part: prolog nodes plus the root element, in document order
#[derive(Debug, Clone, Default)]
pub struct XmlDocument {
    pub nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// New standalone UTF-8 document with the given root
    pub fn with_root(root: XmlElement) -> Self {
        let decl = BytesDecl::new("1.0", Some("UTF-8"), Some("yes"));
        Self {
            nodes: vec![XmlNode::Other(Event::Decl(decl)), XmlNode::Element(root)],
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut nodes: Vec<XmlNode> = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(xml_err)?;
            match event {
                Event::Start(start) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(DocxError::Xml("element nesting too deep".to_string()));
                    }
                    stack.push(XmlElement::from_start(&start)?);
                }
                Event::Empty(start) => {
                    let el = XmlElement::from_start(&start)?;
                    attach(&mut stack, &mut nodes, XmlNode::Element(el));
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| DocxError::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut nodes, XmlNode::Element(el));
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(xml_err)?.into_owned();
                    attach(&mut stack, &mut nodes, XmlNode::Text(text));
                }
                Event::Eof => break,
                other => attach(&mut stack, &mut nodes, XmlNode::Other(other.into_owned())),
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(DocxError::Xml(format!("unclosed element <{}>", open.name)));
        }

        Ok(Self { nodes })
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn attach(stack: &mut [XmlElement], nodes: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => nodes.push(node),
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), DocxError> {
    match node {
        XmlNode::Element(el) => {
            let mut start = BytesStart::new(el.name.as_str());
            for (key, value) in &el.attrs {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            if el.children.is_empty() {
                writer.write_event(Event::Empty(start)).map_err(xml_err)?;
            } else {
                writer.write_event(Event::Start(start)).map_err(xml_err)?;
                for child in &el.children {
                    write_node(writer, child)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(el.name.as_str())))
                    .map_err(xml_err)?;
            }
        }
        XmlNode::Text(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_err)?;
        }
        XmlNode::Other(event) => {
            writer.write_event(event.clone()).map_err(xml_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_structure_and_attributes() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve">Tom &amp; Jerry </w:t></w:r></w:p></w:body></w:document>"#;
        let doc = XmlDocument::parse(xml).unwrap();

        let root = doc.root().unwrap();
        assert_eq!(root.name, "w:document");
        assert_eq!(root.attr("xmlns:w"), Some("urn:w"));

        let mut texts = Vec::new();
        root.descendants("w:t", &mut texts);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].attr("xml:space"), Some("preserve"));
        match &texts[0].children[0] {
            XmlNode::Text(t) => assert_eq!(t, "Tom & Jerry "),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_serialize_round_trip_preserves_content() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?><root a="1 &lt; 2"><!-- note --><child/>text &amp; more</root>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let bytes = doc.to_bytes().unwrap();
        let reparsed = XmlDocument::parse(&bytes).unwrap();

        let root = reparsed.root().unwrap();
        assert_eq!(root.attr("a"), Some("1 < 2"));
        assert!(root.child("child").is_some());
        assert!(String::from_utf8(bytes).unwrap().contains("<!-- note -->"));
    }

    #[test]
    fn test_rejects_unclosed_element() {
        assert!(XmlDocument::parse(b"<root><open></root>").is_err());
        assert!(XmlDocument::parse(b"<root><open>").is_err());
    }

    #[test]
    fn test_rejects_excessive_nesting() {
        let deep = format!("{}{}", "<a>".repeat(MAX_DEPTH + 1), "</a>".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            XmlDocument::parse(deep.as_bytes()),
            Err(DocxError::Xml(msg)) if msg.contains("too deep")
        ));

        let allowed = format!("{}{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        let doc = XmlDocument::parse(allowed.as_bytes()).unwrap();
        assert!(doc.to_bytes().is_ok());
    }

    #[test]
    fn test_with_root_writes_declaration() {
        let doc = XmlDocument::with_root(XmlElement::new("w:comments").with_attr("xmlns:w", "urn:w"));
        let out = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(out.contains("<w:comments xmlns:w=\"urn:w\"/>"));
    }

    #[test]
    fn test_set_attr_replaces_existing() {
        let mut el = XmlElement::new("w:comment").with_attr("w:id", "0");
        el.set_attr("w:id", "3");
        assert_eq!(el.attr("w:id"), Some("3"));
        assert_eq!(el.attrs.len(), 1);
    }

    #[test]
    fn test_position_of_skips_text_nodes() {
        let el = XmlElement::new("w:p")
            .with_text("\n  ")
            .with_child(XmlElement::new("w:pPr"))
            .with_child(XmlElement::new("w:r"));
        assert_eq!(el.position_of("w:pPr"), Some(1));
        assert_eq!(el.position_of("w:r"), Some(2));
        assert_eq!(el.position_of("w:tbl"), None);
    }
}
