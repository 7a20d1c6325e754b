//! Generic XML trees for XML-bodied parts
//!
//! Part bodies are held as plain element trees so the merge engine can
//! rewrite reference attributes in place without re-parsing.

use crate::error::{ModelError, ModelResult};
use quick_xml::events::Event;
use quick_xml::Reader;

/// A child of an element: nested element or text
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// One XML element: qualified name, attributes in document order, children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as it appears in the document (e.g. "p:sldIdLst")
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child element
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Get an attribute value by qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing one of the same name
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// Remove an attribute; returns its old value if present
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(pos).1)
    }

    /// Child elements (text nodes skipped)
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Mutable child elements
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given qualified name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|e| e.name == name)
    }

    /// Mutable first child element with the given qualified name
    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.child_elements_mut().find(|e| e.name == name)
    }

    /// First descendant (depth-first, self included) with the given name
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find(name))
    }

    /// Concatenated text content of this element's direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Visit every element in the tree depth-first, self first
    pub fn visit_mut<F: FnMut(&mut XmlElement)>(&mut self, f: &mut F) {
        f(self);
        for child in self.child_elements_mut() {
            child.visit_mut(f);
        }
    }

    /// Parse a document body into its root element
    pub fn parse(content: &str) -> ModelResult<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from_start(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let elem = element_from_start(e)?;
                    attach(&mut stack, &mut root, elem);
                }
                Ok(Event::End(_)) => {
                    let elem = stack.pop().ok_or_else(|| {
                        ModelError::XmlParse("unbalanced end tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, elem);
                }
                Ok(Event::Text(ref e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| ModelError::XmlParse(e.to_string()))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ModelError::from(e)),
                // Declarations, comments, PIs are not part of the model
                _ => {}
            }
            buf.clear();
        }

        root.ok_or_else(|| ModelError::XmlParse("document has no root element".to_string()))
    }

    /// Serialize this tree as a standalone document
    pub fn to_document(&self) -> String {
        let mut out = String::new();
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push('\n');
        self.write_into(&mut out);
        out
    }

    /// Serialize this tree without a declaration
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_xml(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_into(out),
                XmlNode::Text(t) => out.push_str(&escape_xml(t)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn element_from_start(e: &quick_xml::events::BytesStart) -> ModelResult<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut elem = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ModelError::XmlParse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| ModelError::XmlParse(e.to_string()))?
            .into_owned();
        elem.attrs.push((key, value));
    }
    Ok(elem)
}

fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, elem: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(elem));
    } else if root.is_none() {
        *root = Some(elem);
    }
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let tree = XmlElement::parse(
            r#"<p:sld xmlns:p="urn:x"><p:cSld name="Title"><p:spTree/></p:cSld></p:sld>"#,
        )
        .unwrap();
        assert_eq!(tree.name, "p:sld");
        let csld = tree.child("p:cSld").unwrap();
        assert_eq!(csld.attr("name"), Some("Title"));
        assert!(csld.child("p:spTree").is_some());
    }

    #[test]
    fn test_parse_text() {
        let tree = XmlElement::parse("<a:t>Hello &amp; goodbye</a:t>").unwrap();
        assert_eq!(tree.text(), "Hello & goodbye");
    }

    #[test]
    fn test_roundtrip() {
        let xml = r#"<p:sld><p:cSld name="A &amp; B"><a:t>x</a:t></p:cSld></p:sld>"#;
        let tree = XmlElement::parse(xml).unwrap();
        let out = tree.to_xml();
        let reparsed = XmlElement::parse(&out).unwrap();
        assert_eq!(tree, reparsed);
    }

    #[test]
    fn test_set_and_remove_attr() {
        let mut e = XmlElement::new("a:blip").with_attr("r:embed", "rId1");
        e.set_attr("r:embed", "rId9");
        assert_eq!(e.attr("r:embed"), Some("rId9"));
        assert_eq!(e.remove_attr("r:embed"), Some("rId9".to_string()));
        assert_eq!(e.attr("r:embed"), None);
    }

    #[test]
    fn test_find_descendant() {
        let tree = XmlElement::parse(
            r#"<p:sld><p:cSld><p:spTree><a:blip r:embed="rId2"/></p:spTree></p:cSld></p:sld>"#,
        )
        .unwrap();
        assert_eq!(tree.find("a:blip").unwrap().attr("r:embed"), Some("rId2"));
        assert!(tree.find("a:missing").is_none());
    }

    #[test]
    fn test_visit_mut_rewrites_all() {
        let mut tree = XmlElement::parse(
            r#"<root><a:blip r:embed="rId1"/><nest><a:blip r:embed="rId1"/></nest></root>"#,
        )
        .unwrap();
        let mut count = 0;
        tree.visit_mut(&mut |e| {
            if e.name == "a:blip" {
                e.set_attr("r:embed", "rId5");
                count += 1;
            }
        });
        assert_eq!(count, 2);
        assert!(!tree.to_xml().contains("rId1"));
    }
}
