//! XML element tree
//!
//! The mapper works on a fully materialized tree: documents are parsed into
//! [`Element`]s before any class is resolved, and serialization builds a tree
//! that is rendered to text in one pass at the end.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::names::{split_qname, validate_qname};
use crate::namespaces::{is_xsi_attribute, NamespaceContext, XSI_NAMESPACE, XSI_NIL, XSI_PREFIX};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// XML Element in the document tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Element name as written in the document (may carry a prefix)
    pub name: String,
    /// Attributes in document order; schema instance attributes use the `xsi:` prefix
    pub attributes: IndexMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder form of [`Element::set_text`]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder form of [`Element::set_attribute`]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder form of [`Element::add_child`]
    pub fn with_child(mut self, child: Element) -> Self {
        self.add_child(child);
        self
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    /// Get an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Set (or replace) an attribute, keeping its original position
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Text content, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Whether the element carries an explicit nil marker
    pub fn is_nil(&self) -> bool {
        matches!(self.attribute(XSI_NIL), Some("true") | Some("1"))
    }

    fn push_text(&mut self, text: &str) {
        match self.text {
            Some(ref mut existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    // Formatting whitespace between child elements is not content.
    fn finish(mut self) -> Self {
        if !self.children.is_empty()
            && self.text.as_deref().map_or(false, |t| t.trim().is_empty())
        {
            self.text = None;
        }
        self
    }

    fn uses_xsi(&self) -> bool {
        self.attributes.keys().any(|name| is_xsi_attribute(name))
            || self.children.iter().any(Element::uses_xsi)
    }

    /// Parse an XML document and return its root element
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document, failing once nesting exceeds `limits.max_depth`
    pub fn parse_with_limits(xml: &str, limits: &Limits) -> Result<Self> {
        let mut reader = Reader::from_reader(xml.as_bytes());

        let mut stack: Vec<(Element, NamespaceContext)> = Vec::new();
        let mut root: Option<Element> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_depth(stack.len())?;
                    let scope = stack.last().map(|(_, ns)| ns.clone()).unwrap_or_default();
                    stack.push(Self::parse_start(&e, scope)?);
                }
                Ok(Event::End(_)) => {
                    if let Some((current, _)) = stack.pop() {
                        Self::attach(&mut stack, &mut root, current.finish())?;
                    }
                }
                Ok(Event::Empty(e)) => {
                    limits.check_depth(stack.len())?;
                    let scope = stack.last().map(|(_, ns)| ns.clone()).unwrap_or_default();
                    let (element, _) = Self::parse_start(&e, scope)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(e)) => {
                    if let Some((current, _)) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::MalformedXml(format!("Failed to unescape text: {}", e)))?;
                        current.push_text(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some((current, _)) = stack.last_mut() {
                        let text = std::str::from_utf8(&e)
                            .map_err(|e| Error::MalformedXml(format!("Invalid CDATA: {}", e)))?;
                        current.push_text(text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::MalformedXml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
            buf.clear();
        }

        if let Some((open, _)) = stack.last() {
            return Err(Error::MalformedXml(format!(
                "Unexpected end of document: <{}> is not closed",
                open.name
            )));
        }

        root.ok_or_else(|| Error::MalformedXml("Document has no root element".to_string()))
    }

    fn attach(
        stack: &mut [(Element, NamespaceContext)],
        root: &mut Option<Element>,
        element: Element,
    ) -> Result<()> {
        if let Some((parent, _)) = stack.last_mut() {
            parent.add_child(element);
        } else if root.is_some() {
            return Err(Error::MalformedXml(format!(
                "Unexpected second root element <{}>",
                element.name
            )));
        } else {
            *root = Some(element);
        }
        Ok(())
    }

    /// Parse element from BytesStart event
    fn parse_start(
        start: &BytesStart,
        mut scope: NamespaceContext,
    ) -> Result<(Element, NamespaceContext)> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::MalformedXml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut element = Element::new(name);
        let mut regular = Vec::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::MalformedXml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::MalformedXml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::MalformedXml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            // Namespace declarations only feed the scope
            if attr_name == "xmlns" {
                scope.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                scope.add_prefix(prefix, attr_value);
            } else {
                regular.push((attr_name, attr_value));
            }
        }

        // Declarations may follow the attributes that use them
        for (attr_name, attr_value) in regular {
            element.set_attribute(scope.canonical_attribute(&attr_name), attr_value);
        }

        Ok((element, scope))
    }

    /// Convert an element of an already parsed `roxmltree` document
    pub fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self> {
        Self::from_node_with_limits(node, &Limits::default())
    }

    /// Convert a `roxmltree` element, failing once nesting exceeds `limits.max_depth`
    pub fn from_node_with_limits(node: roxmltree::Node<'_, '_>, limits: &Limits) -> Result<Self> {
        Self::convert_node(node, limits, 0)
    }

    fn convert_node(node: roxmltree::Node<'_, '_>, limits: &Limits, depth: usize) -> Result<Self> {
        limits.check_depth(depth)?;
        let mut element = Element::new(node.tag_name().name());

        for attr in node.attributes() {
            let name = match attr.namespace() {
                Some(XSI_NAMESPACE) => format!("{}:{}", XSI_PREFIX, attr.name()),
                Some(ns) => match node.lookup_prefix(ns) {
                    Some(prefix) => format!("{}:{}", prefix, attr.name()),
                    None => attr.name().to_string(),
                },
                None => attr.name().to_string(),
            };
            element.set_attribute(name, attr.value());
        }

        for child in node.children() {
            if child.is_element() {
                element.add_child(Self::convert_node(child, limits, depth + 1)?);
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    element.push_text(text);
                }
            }
        }

        Ok(element.finish())
    }

    /// Render the element as a standalone XML document.
    ///
    /// Output is compact, starts with an XML declaration and declares the
    /// `xsi` prefix on this element when the tree uses it.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;

        let declare_xsi = self.uses_xsi() && !self.attributes.contains_key("xmlns:xsi");
        self.write(&mut writer, declare_xsi)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::MalformedXml(format!("Rendered XML is not UTF-8: {}", e)))
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>, declare_xsi: bool) -> Result<()> {
        validate_qname(&self.name)?;

        let mut start = BytesStart::new(self.name.as_str());
        if declare_xsi {
            start.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        }
        for (name, value) in &self.attributes {
            validate_qname(name)?;
            start.push_attribute((name.as_str(), value.as_str()));
        }

        let text = self.text.as_deref().filter(|t| !t.is_empty());
        if text.is_none() && self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(text) = text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write(writer, false)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)
    }
}

fn write_error(e: impl std::fmt::Display) -> Error {
    Error::MalformedXml(format!("Failed to write XML: {}", e))
}
