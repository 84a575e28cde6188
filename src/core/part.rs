//! Lazily parsed XML parts
//!
//! An ODF package is a container of named parts (`content.xml`, `meta.xml`,
//! `styles.xml`, ...). [`XmlPart`] wraps one of them: the bytes are fetched
//! from the [`Container`] and parsed on first access, and the tree is then kept
//! for the life of the part so every handle handed out aliases the same
//! document.

use crate::core::element::ElementNode;
use crate::core::error::{OdfError, OdfResult};
use crate::core::parser::XmlParser;
use crate::core::serializer::XmlSerializer;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Source of part bytes
pub trait Container {
    /// Bytes of the named part; [`OdfError::PartNotFound`] when absent
    fn get_part(&self, name: &str) -> OdfResult<Vec<u8>>;
}

impl<T: Container + ?Sized> Container for &T {
    fn get_part(&self, name: &str) -> OdfResult<Vec<u8>> {
        (**self).get_part(name)
    }
}

impl<T: Container + ?Sized> Container for Rc<T> {
    fn get_part(&self, name: &str) -> OdfResult<Vec<u8>> {
        (**self).get_part(name)
    }
}

impl<T: Container + ?Sized> Container for Box<T> {
    fn get_part(&self, name: &str) -> OdfResult<Vec<u8>> {
        (**self).get_part(name)
    }
}

/// In-memory container keyed by part name
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    parts: HashMap<String, Vec<u8>>,
}

impl MemoryContainer {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemoryContainer::set_part`]
    pub fn with_part(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.set_part(name, bytes);
        self
    }

    /// Store or replace a part
    pub fn set_part(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.parts.insert(name.into(), bytes.into());
    }

    /// Remove a part, returning its bytes
    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    /// Check whether a part exists
    pub fn has_part(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }
}

impl Container for MemoryContainer {
    fn get_part(&self, name: &str) -> OdfResult<Vec<u8>> {
        self.parts
            .get(name)
            .cloned()
            .ok_or_else(|| OdfError::PartNotFound(name.to_string()))
    }
}

/// A parsed part: root element plus the text around it
#[derive(Debug)]
pub struct Document {
    root: ElementNode,
    prolog: String,
    epilog: String,
}

impl Document {
    /// Parse a whole document
    ///
    /// Malformed input fails [`OdfError::InvalidMarkup`].
    pub fn parse(bytes: &[u8]) -> OdfResult<Self> {
        let tree = XmlParser::new().parse(bytes)?;
        Ok(Self {
            root: ElementNode::from_node(tree.root),
            prolog: tree.prolog,
            epilog: tree.epilog,
        })
    }

    /// Root element
    pub fn root(&self) -> &ElementNode {
        &self.root
    }

    /// Text before the root element, verbatim
    pub fn prolog(&self) -> &str {
        &self.prolog
    }

    /// Text after the root element, verbatim
    pub fn epilog(&self) -> &str {
        &self.epilog
    }

    /// Serialize the whole document
    pub fn serialize(&self, pretty: bool) -> OdfResult<Vec<u8>> {
        let serializer = if pretty {
            XmlSerializer::pretty()
        } else {
            XmlSerializer::new()
        };
        serializer.serialize_document(self.root.node(), &self.prolog, &self.epilog)
    }
}

/// One XML part of a container, parsed on first use
#[derive(Debug)]
pub struct XmlPart<C> {
    part_name: String,
    container: C,
    document: RefCell<Option<Document>>,
}

impl<C: Container> XmlPart<C> {
    /// Create a part; nothing is fetched yet
    pub fn new(part_name: impl Into<String>, container: C) -> Self {
        Self {
            part_name: part_name.into(),
            container,
            document: RefCell::new(None),
        }
    }

    /// Name of the part inside its container
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    /// The backing container
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Whether the part has been fetched and parsed
    pub fn is_loaded(&self) -> bool {
        self.document.borrow().is_some()
    }

    fn fetch(&self) -> OdfResult<Document> {
        let bytes = self.container.get_part(&self.part_name)?;
        debug!("parsing part '{}' ({} bytes)", self.part_name, bytes.len());
        Document::parse(&bytes).map_err(|err| match err {
            OdfError::InvalidMarkup(reason) => OdfError::MalformedPart {
                part: self.part_name.clone(),
                reason,
            },
            other => other,
        })
    }

    /// Run `f` on the parsed document, parsing it first if needed
    fn with_document<R>(&self, f: impl FnOnce(&Document) -> OdfResult<R>) -> OdfResult<R> {
        let mut slot = self.document.borrow_mut();
        let document = match slot.take() {
            Some(document) => document,
            None => self.fetch()?,
        };
        f(&*slot.insert(document))
    }

    /// Root element of the part
    pub fn root(&self) -> OdfResult<ElementNode> {
        self.with_document(|document| Ok(document.root().clone()))
    }

    /// Every element matching `xpath`, evaluated from the root element
    pub fn get_element_list(&self, xpath: &str) -> OdfResult<Vec<ElementNode>> {
        self.with_document(|document| document.root().query(xpath))
    }

    /// First element matching `xpath`
    pub fn get_element(&self, xpath: &str) -> OdfResult<Option<ElementNode>> {
        Ok(self.get_element_list(xpath)?.into_iter().next())
    }

    /// Whole-document markup, namespace declarations included
    pub fn serialize(&self, pretty: bool) -> OdfResult<Vec<u8>> {
        self.with_document(|document| document.serialize(pretty))
    }

    /// Remove a direct child of the root element
    pub fn delete_child(&self, child: &ElementNode) -> OdfResult<()> {
        self.with_document(|document| document.root().delete_child(child))
    }

    /// Drop the parsed tree; the next access fetches the part again
    ///
    /// Handles obtained earlier stay valid but no longer belong to the part.
    pub fn clear_cache(&self) {
        if self.document.borrow_mut().take().is_some() {
            debug!("dropped cached tree for part '{}'", self.part_name);
        }
    }
}
