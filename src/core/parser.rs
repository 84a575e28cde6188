//! ODF XML parser
//!
//! This module turns part bytes into a node tree. Names are resolved against
//! the namespace declarations in scope and stored in native `{uri}local`
//! form; the declarations themselves are kept on the element that made them
//! so the document serializes back with the same prefixes. Whatever precedes
//! the root element (XML declaration, doctype, comments, whitespace) and
//! whatever follows it is kept verbatim.
//!
//! Start tags and character data also remember the markup they were decoded
//! from, and empty elements written as `<a></a>` are flagged, so an unedited
//! tree serializes back to the same bytes.

use crate::core::error::{OdfError, OdfResult};
use crate::core::namespace::ns;
use crate::core::node::{
    descendants, insert_child, new_node, ElementData, NamespaceDecl, NodeKind, NodeRef, SourceTag,
    Verbatim,
};
use crate::core::qname::encode;
use crate::core::serializer::escape_text;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::rc::Rc;

const UTF8_BOM: &str = "\u{feff}";

/// A parsed document: the root element and the text around it
#[derive(Debug, Clone)]
pub struct ParsedTree {
    pub(crate) root: NodeRef,
    /// Verbatim text before the root element
    pub prolog: String,
    /// Verbatim text after the root element
    pub epilog: String,
}

/// Parser for ODF XML parts
#[derive(Debug, Default)]
pub struct XmlParser {
    scopes: Vec<Vec<NamespaceDecl>>,
    stack: Vec<NodeRef>,
}

impl XmlParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete document
    ///
    /// Failures are [`OdfError::InvalidMarkup`] with a human-readable reason;
    /// callers remap the kind where they know more context.
    pub fn parse(&mut self, bytes: &[u8]) -> OdfResult<ParsedTree> {
        self.scopes.clear();
        self.stack.clear();

        let text = std::str::from_utf8(bytes)
            .map_err(|e| invalid(format!("Invalid UTF-8 in document: {}", e)))?;
        let bom_len = if text.starts_with(UTF8_BOM) {
            UTF8_BOM.len()
        } else {
            0
        };
        let body = &text[bom_len..];

        let mut reader = Reader::from_str(body);
        let mut root: Option<NodeRef> = None;
        let mut prolog_end = None;
        let mut epilog_start = None;

        loop {
            let event_start = reader.buffer_position() as usize;
            let event = reader
                .read_event()
                .map_err(|e| invalid(format!("XML parsing error at byte {}: {}", event_start, e)))?;
            match event {
                Event::Start(e) => {
                    let node = self.open_element(&e)?;
                    if self.stack.is_empty() {
                        if root.is_some() {
                            return Err(invalid("Multiple root elements"));
                        }
                        prolog_end = Some(event_start);
                        root = Some(Rc::clone(&node));
                    }
                    self.stack.push(node);
                }
                Event::Empty(e) => {
                    let node = self.open_element(&e)?;
                    self.scopes.pop();
                    if self.stack.is_empty() {
                        if root.is_some() {
                            return Err(invalid("Multiple root elements"));
                        }
                        prolog_end = Some(event_start);
                        epilog_start = Some(reader.buffer_position() as usize);
                        root = Some(node);
                    }
                }
                Event::End(_) => {
                    if let Some(node) = self.stack.pop() {
                        let mut data = node.borrow_mut();
                        if data.text.is_none() && data.children.is_empty() {
                            if let Some(element) = data.as_element_mut() {
                                element.explicit_end = true;
                            }
                        }
                    }
                    self.scopes.pop();
                    if self.stack.is_empty() {
                        epilog_start = Some(reader.buffer_position() as usize);
                    }
                }
                Event::Text(e) => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| invalid(format!("Invalid UTF-8 in text: {}", e)))?;
                    let decoded = unescape(raw)
                        .map_err(|e| invalid(format!("Invalid text content: {}", e)))?;
                    self.push_text(&decoded, raw)?;
                }
                Event::CData(e) => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| invalid(format!("Invalid UTF-8 in CDATA: {}", e)))?;
                    self.push_text(raw, &format!("<![CDATA[{}]]>", raw))?;
                }
                Event::GeneralRef(e) => {
                    let name = std::str::from_utf8(e.as_ref())
                        .map_err(|e| invalid(format!("Invalid UTF-8 in reference: {}", e)))?;
                    let reference = format!("&{};", name);
                    let decoded = unescape(&reference).map_err(|e| {
                        invalid(format!("Unresolvable reference {}: {}", reference, e))
                    })?;
                    self.push_text(&decoded, &reference)?;
                }
                Event::Comment(e) => {
                    let content = std::str::from_utf8(e.as_ref())
                        .map_err(|e| invalid(format!("Invalid UTF-8 in comment: {}", e)))?;
                    self.push_misc(NodeKind::Comment(content.to_string()));
                }
                Event::PI(e) => {
                    let content = std::str::from_utf8(e.as_ref()).map_err(|e| {
                        invalid(format!("Invalid UTF-8 in processing instruction: {}", e))
                    })?;
                    self.push_misc(NodeKind::ProcessingInstruction(content.to_string()));
                }
                Event::Eof => break,
                // Declaration and doctype only occur before the root and are
                // carried by the verbatim prolog
                _ => {}
            }
        }

        if !self.stack.is_empty() {
            return Err(invalid("Unexpected end of document: unclosed element"));
        }
        let root = root.ok_or_else(|| invalid("No root element found"))?;
        drop_redundant_sources(&root);
        let prolog_end = bom_len + prolog_end.unwrap_or(0);
        let epilog_start = bom_len + epilog_start.unwrap_or(body.len());

        Ok(ParsedTree {
            root,
            prolog: text[..prolog_end].to_string(),
            epilog: text[epilog_start..].to_string(),
        })
    }

    /// Build an element node from a start tag and attach it to the open parent
    ///
    /// Pushes the element's namespace scope; the caller pops it.
    fn open_element(&mut self, e: &BytesStart<'_>) -> OdfResult<NodeRef> {
        let markup = std::str::from_utf8(&**e)
            .map_err(|e| invalid(format!("Invalid UTF-8 in start tag: {}", e)))?
            .to_string();
        let name = std::str::from_utf8(e.name().as_ref())
            .map_err(|e| invalid(format!("Invalid UTF-8 in tag name: {}", e)))?
            .to_string();

        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr in e.attributes() {
            let attr =
                attr.map_err(|e| invalid(format!("Invalid attribute in <{}>: {}", name, e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| invalid(format!("Invalid UTF-8 in attribute name: {}", e)))?
                .to_string();
            let raw_value = std::str::from_utf8(attr.value.as_ref())
                .map_err(|e| invalid(format!("Invalid UTF-8 in attribute value: {}", e)))?;
            let value = unescape(raw_value)
                .map_err(|e| invalid(format!("Invalid value for attribute {}: {}", key, e)))?
                .into_owned();

            if key == "xmlns" {
                declarations.push(NamespaceDecl::new(None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push(NamespaceDecl::new(Some(prefix), value));
            } else {
                raw_attributes.push((key, value));
            }
        }
        self.scopes.push(declarations.clone());

        let mut element = ElementData::new(self.resolve(&name, true)?);
        element.namespaces = declarations;
        let mut attribute_names = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            let native = self.resolve(&key, false)?;
            if element.get_attribute(&native).is_some() {
                return Err(invalid(format!("Duplicate attribute {} in <{}>", key, name)));
            }
            element.attributes.push((native, value));
            attribute_names.push(key);
        }
        element.source = Some(SourceTag {
            markup,
            attributes: element.attributes.clone(),
            namespaces: element.namespaces.clone(),
            name,
            attribute_names,
        });

        let node = new_node(NodeKind::Element(element));
        if let Some(parent) = self.stack.last() {
            let len = parent.borrow().children.len();
            insert_child(parent, len, &node);
        }
        Ok(node)
    }

    /// Resolve a prefixed name against the declarations in scope
    ///
    /// Unprefixed element names take the default namespace; unprefixed
    /// attribute names never do.
    fn resolve(&self, name: &str, use_default: bool) -> OdfResult<String> {
        if let Some((prefix, local)) = name.split_once(':') {
            if prefix == ns::XML_PREFIX {
                return Ok(encode(Some(ns::XML), local));
            }
            let uri = self
                .lookup(Some(prefix))
                .ok_or_else(|| invalid(format!("Unbound namespace prefix '{}'", prefix)))?;
            return Ok(encode(Some(uri), local));
        }
        if use_default {
            if let Some(uri) = self.lookup(None).filter(|uri| !uri.is_empty()) {
                return Ok(encode(Some(uri), name));
            }
        }
        Ok(name.to_string())
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|decl| decl.prefix.as_deref() == prefix)
            .map(|decl| decl.uri.as_str())
    }

    /// Append character data to the open element (as text or as the tail of
    /// its last child), along with the markup it was decoded from
    fn push_text(&mut self, text: &str, markup: &str) -> OdfResult<()> {
        let Some(current) = self.stack.last() else {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(invalid("Text outside the root element"));
        };
        let last_child = current.borrow().children.last().cloned();
        match last_child {
            Some(child) => {
                let mut data = child.borrow_mut();
                let data = &mut *data;
                append_text(&mut data.tail, &mut data.tail_source, text, markup);
            }
            None => {
                let mut data = current.borrow_mut();
                let data = &mut *data;
                append_text(&mut data.text, &mut data.text_source, text, markup);
            }
        }
        Ok(())
    }

    /// Attach a comment or processing instruction; outside the root these
    /// live in the verbatim prolog/epilog instead
    fn push_misc(&mut self, kind: NodeKind) {
        if let Some(parent) = self.stack.last() {
            let node = new_node(kind);
            let len = parent.borrow().children.len();
            insert_child(parent, len, &node);
        }
    }
}

fn invalid(reason: impl Into<String>) -> OdfError {
    OdfError::InvalidMarkup(reason.into())
}

fn append_text(
    value: &mut Option<String>,
    source: &mut Option<Verbatim>,
    text: &str,
    markup: &str,
) {
    value.get_or_insert_with(String::new).push_str(text);
    let source = source.get_or_insert_with(Verbatim::default);
    source.value.push_str(text);
    source.markup.push_str(markup);
}

/// Forget source markup that plain escaping reproduces anyway
fn drop_redundant_sources(root: &NodeRef) {
    for node in std::iter::once(Rc::clone(root)).chain(descendants(root)) {
        let mut data = node.borrow_mut();
        let data = &mut *data;
        for source in [&mut data.text_source, &mut data.tail_source] {
            if source
                .as_ref()
                .is_some_and(|s| escape_text(&s.value) == s.markup)
            {
                *source = None;
            }
        }
    }
}
