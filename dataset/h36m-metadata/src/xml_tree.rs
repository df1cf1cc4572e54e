//! A minimal read-only element tree over the `xml` event reader.
//!
//! Only element names, their directly contained text and their child
//! elements are kept. Attributes, comments and processing instructions are
//! dropped because nothing in the Human3.6M metadata needs them.

use std::io::Read;

use xml::reader::{EventReader, XmlEvent};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    text: Option<String>,
    children: Vec<Element>,
}

/// An element whose end tag has not been seen yet.
struct OpenElement {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl OpenElement {
    fn close(self) -> Element {
        let text = self.text.trim();
        let text = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        Element {
            name: self.name,
            text,
            children: self.children,
        }
    }
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Parse a complete document and return its root element.
    pub fn parse<R: Read>(rdr: R) -> Result<Self> {
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut root = None;

        for event in EventReader::new(rdr) {
            match event? {
                XmlEvent::StartElement { name, .. } => {
                    stack.push(OpenElement {
                        name: name.local_name,
                        text: String::new(),
                        children: Vec::new(),
                    });
                }
                XmlEvent::Characters(s) | XmlEvent::CData(s) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&s);
                    }
                }
                XmlEvent::EndElement { .. } => {
                    let closed = stack
                        .pop()
                        .ok_or_else(|| Error::malformed("end tag without start tag"))?
                        .close();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(closed),
                        None => root = Some(closed),
                    }
                }
                _ => {}
            }
        }

        root.ok_or_else(|| Error::malformed("document has no root element"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed text directly inside this element, `None` when there is none.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follow a `/`-separated path of child names, e.g. `dbcameras/index2id`.
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(self, |el, part| el.child(part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let buf = r#"<?xml version="1.0"?>
            <root>
              <a><b>  hello </b><b/><b><![CDATA[raw]]></b></a>
              <c>tail</c>
            </root>"#;
        let root = Element::parse(buf.as_bytes()).unwrap();
        assert_eq!(root.name(), "root");
        assert_eq!(root.text(), None);
        let a = root.child("a").unwrap();
        let texts: Vec<_> = a.children().iter().map(Element::text).collect();
        assert_eq!(texts, vec![Some("hello"), None, Some("raw")]);
        assert_eq!(root.find("c").and_then(Element::text), Some("tail"));
        assert_eq!(root.find("a/b").and_then(Element::text), Some("hello"));
        assert!(root.find("a/missing").is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Element::parse("<root><a></root>".as_bytes()),
            Err(Error::Xml(_))
        ));
        assert!(Element::parse("".as_bytes()).is_err());
    }
}
