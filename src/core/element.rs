//! Element handles
//!
//! [`ElementNode`] is a cheap handle onto an element in a parsed part or in a
//! standalone fragment. Handles alias: two handles onto the same element see
//! each other's edits, and equality is identity. Names cross the API in
//! `prefix:local` form and are translated with the ODF namespace registry.

use crate::core::error::{OdfError, OdfResult};
use crate::core::namespace::NamespaceRegistry;
use crate::core::node::{
    child_index, deep_clone, detach, insert_child, is_ancestor_or_self, new_node, parent_of,
    string_value, ElementData, NodeKind, NodeRef,
};
use crate::core::parser::XmlParser;
use crate::core::qname::{native_form, prefixed_form, QName};
use crate::core::serializer::XmlSerializer;
use crate::core::xpath::{PathEvaluator, QueryEvaluator};
use crate::utils::datetime::OdfDateTime;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

static NAMESPACES_TEMPLATE: OnceLock<String> = OnceLock::new();

/// Placeholder replaced by fragment markup in the namespaces template
const ELEMENT_PLACEHOLDER: &str = "{element}";

/// Prefixes whose elements describe styles
const STYLE_PREFIXES: &[&str] = &["style", "number"];

/// A document root declaring every registry namespace around a placeholder
fn namespaces_template() -> &'static str {
    NAMESPACES_TEMPLATE.get_or_init(|| {
        let mut template = String::from("<office:document-content");
        for (prefix, uri) in NamespaceRegistry::odf().iter() {
            template.push_str(&format!(" xmlns:{}=\"{}\"", prefix, uri));
        }
        template.push_str(" office:version=\"1.2\">");
        template.push_str(ELEMENT_PLACEHOLDER);
        template.push_str("</office:document-content>");
        template
    })
}

/// Where [`ElementNode::insert`] places the new element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Before every existing child
    FirstChild,
    /// After every existing child
    LastChild,
    /// Right after this element, in its parent
    NextSibling,
    /// Right before this element, in its parent
    PreviousSibling,
}

/// Handle onto an element
#[derive(Clone)]
pub struct ElementNode {
    node: NodeRef,
}

impl ElementNode {
    /// Wrap an element node
    pub(crate) fn from_node(node: NodeRef) -> Self {
        debug_assert!(node.borrow().is_element());
        Self { node }
    }

    pub(crate) fn node(&self) -> &NodeRef {
        &self.node
    }

    fn with_element<R>(&self, f: impl FnOnce(&ElementData) -> R) -> R {
        let data = self.node.borrow();
        match &data.kind {
            NodeKind::Element(element) => f(element),
            _ => unreachable!("element handles always wrap element nodes"),
        }
    }

    fn with_element_mut<R>(&self, f: impl FnOnce(&mut ElementData) -> R) -> R {
        let mut data = self.node.borrow_mut();
        match &mut data.kind {
            NodeKind::Element(element) => f(element),
            _ => unreachable!("element handles always wrap element nodes"),
        }
    }

    /// Native `{uri}local` tag
    pub fn native_name(&self) -> String {
        self.with_element(|e| e.tag.clone())
    }

    /// Tag in `prefix:local` form
    pub fn name(&self) -> OdfResult<String> {
        prefixed_form(&self.native_name())
    }

    /// Local part of the tag
    pub fn local_name(&self) -> String {
        self.with_element(|e| QName::split_native(&e.tag).1.to_string())
    }

    /// Namespace URI of the tag
    pub fn namespace_uri(&self) -> Option<String> {
        self.with_element(|e| QName::split_native(&e.tag).0.map(str::to_string))
    }

    /// Run a query with the bundled [`PathEvaluator`]
    pub fn query(&self, xpath: &str) -> OdfResult<Vec<ElementNode>> {
        self.query_with(&PathEvaluator, xpath)
    }

    /// Run a query with a caller-supplied evaluator
    pub fn query_with(
        &self,
        evaluator: &dyn QueryEvaluator,
        xpath: &str,
    ) -> OdfResult<Vec<ElementNode>> {
        evaluator.evaluate(self, xpath, NamespaceRegistry::odf())
    }

    /// First result of [`ElementNode::query`]
    pub fn query_one(&self, xpath: &str) -> OdfResult<Option<ElementNode>> {
        Ok(self.query(xpath)?.into_iter().next())
    }

    /// Value of an attribute, `None` when absent
    pub fn get_attribute(&self, qname: &str) -> OdfResult<Option<String>> {
        let native = native_form(qname)?;
        Ok(self.with_element(|e| e.get_attribute(&native).map(str::to_string)))
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&self, qname: &str, value: &str) -> OdfResult<()> {
        let native = native_form(qname)?;
        self.with_element_mut(|e| e.set_attribute(native, value));
        Ok(())
    }

    /// Remove an attribute
    pub fn delete_attribute(&self, qname: &str) -> OdfResult<()> {
        let native = native_form(qname)?;
        self.with_element_mut(|e| e.remove_attribute(&native))
            .map(|_| ())
            .ok_or_else(|| OdfError::AttributeNotFound(qname.to_string()))
    }

    /// Every attribute keyed by its `prefix:local` name
    pub fn attributes(&self) -> OdfResult<BTreeMap<String, String>> {
        let attributes = self.with_element(|e| e.attributes.clone());
        attributes
            .into_iter()
            .map(|(native, value)| -> OdfResult<(String, String)> {
                Ok((prefixed_form(&native)?, value))
            })
            .collect()
    }

    /// Own text followed by the tail of the last child
    pub fn text(&self) -> String {
        let data = self.node.borrow();
        let mut text = data.text.clone().unwrap_or_default();
        if let Some(last) = data.children.last() {
            if let Some(tail) = &last.borrow().tail {
                text.push_str(tail);
            }
        }
        text
    }

    /// Replace the leading text
    pub fn set_text(&self, text: &str) {
        self.node.borrow_mut().text = Some(text.to_string());
    }

    /// Text following this element inside its parent
    pub fn tail(&self) -> Option<String> {
        self.node.borrow().tail.clone()
    }

    /// Replace the text following this element inside its parent
    pub fn set_text_after(&self, text: &str) {
        self.node.borrow_mut().tail = Some(text.to_string());
    }

    /// String value of the embedded `text:p` child, empty when there is none
    pub fn get_text_content(&self) -> OdfResult<String> {
        Ok(self
            .query_one("text:p")?
            .map(|p| string_value(&p.node))
            .unwrap_or_default())
    }

    /// Replace the content of the embedded `text:p` child
    ///
    /// A `text:p` is created as the first child when missing.
    pub fn set_text_content(&self, text: &str) -> OdfResult<()> {
        let paragraph = match self.query_one("text:p")? {
            Some(paragraph) => paragraph,
            None => {
                let paragraph = ElementNode::from_node(new_node(NodeKind::Element(
                    ElementData::new(native_form("text:p")?),
                )));
                self.insert(&paragraph, InsertPosition::FirstChild)?;
                paragraph
            }
        };
        paragraph.clear();
        paragraph.set_text(text);
        Ok(())
    }

    /// Move `element` relative to this element
    ///
    /// The element is detached from its previous parent first; its tail moves
    /// with it.
    pub fn insert(&self, element: &ElementNode, position: InsertPosition) -> OdfResult<()> {
        let target = match position {
            InsertPosition::FirstChild | InsertPosition::LastChild => Rc::clone(&self.node),
            InsertPosition::NextSibling | InsertPosition::PreviousSibling => {
                if element == self {
                    return Err(OdfError::CyclicInsert);
                }
                parent_of(&self.node).ok_or(OdfError::NoParent)?
            }
        };
        if is_ancestor_or_self(&element.node, &target) {
            return Err(OdfError::CyclicInsert);
        }

        detach(&element.node);
        let index = match position {
            InsertPosition::FirstChild => 0,
            InsertPosition::LastChild => target.borrow().children.len(),
            InsertPosition::NextSibling => {
                child_index(&target, &self.node).ok_or(OdfError::NoParent)? + 1
            }
            InsertPosition::PreviousSibling => {
                child_index(&target, &self.node).ok_or(OdfError::NoParent)?
            }
        };
        insert_child(&target, index, &element.node);
        Ok(())
    }

    /// Detach a direct child; the child keeps its tail
    pub fn delete_child(&self, child: &ElementNode) -> OdfResult<()> {
        match parent_of(&child.node) {
            Some(parent) if Rc::ptr_eq(&parent, &self.node) => {
                detach(&child.node);
                Ok(())
            }
            _ => Err(OdfError::NotAChild),
        }
    }

    /// Remove every child and the leading text; attributes and tail stay
    pub fn clear(&self) {
        let children = self.node.borrow().children.clone();
        for child in &children {
            detach(child);
        }
        self.node.borrow_mut().text = None;
    }

    /// Deep, parentless copy
    pub fn copy(&self) -> ElementNode {
        ElementNode::from_node(deep_clone(&self.node))
    }

    /// Fragment markup, without namespace declarations or the element's tail
    pub fn serialize(&self) -> OdfResult<Vec<u8>> {
        XmlSerializer::new().serialize_fragment(&self.node)
    }

    /// Text of the first `dc:creator` in the document
    pub fn creator(&self) -> OdfResult<Option<String>> {
        Ok(self.query_one("//dc:creator")?.map(|e| e.text()))
    }

    /// Decoded value of the first `dc:date` in the document
    pub fn date(&self) -> OdfResult<Option<OdfDateTime>> {
        match self.query_one("//dc:date")? {
            Some(element) => OdfDateTime::parse(&element.text()).map(Some),
            None => Ok(None),
        }
    }

    /// Whether this is a `style:*` or `number:*` element other than
    /// `*:properties`
    pub fn is_style_element(&self) -> OdfResult<bool> {
        let name = self.name()?;
        Ok(match name.split_once(':') {
            Some((prefix, local)) => STYLE_PREFIXES.contains(&prefix) && local != "properties",
            None => false,
        })
    }

    /// Parent element
    pub fn parent(&self) -> Option<ElementNode> {
        parent_of(&self.node).map(ElementNode::from_node)
    }

    /// Element children in document order
    pub fn children(&self) -> Vec<ElementNode> {
        self.node
            .borrow()
            .children
            .iter()
            .filter(|child| child.borrow().is_element())
            .cloned()
            .map(ElementNode::from_node)
            .collect()
    }
}

impl PartialEq for ElementNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for ElementNode {}

impl fmt::Debug for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementNode")
            .field("tag", &self.native_name())
            .finish()
    }
}

/// Build a standalone element from `prefix:local` markup
///
/// Any registry prefix may be used without declaring it. The markup must hold
/// exactly one element; surrounding whitespace is ignored.
pub fn create_element(markup: &str) -> OdfResult<ElementNode> {
    if markup.trim().is_empty() {
        return Err(OdfError::InvalidMarkup("Element data is empty".to_string()));
    }

    let data = namespaces_template().replace(ELEMENT_PLACEHOLDER, markup);
    let tree = XmlParser::new().parse(data.as_bytes())?;

    let root = tree.root.borrow();
    let [child] = root.children.as_slice() else {
        return Err(OdfError::InvalidMarkup(format!(
            "Expected exactly one element, found {} nodes",
            root.children.len()
        )));
    };
    if !child.borrow().is_element() {
        return Err(OdfError::InvalidMarkup("Expected an element".to_string()));
    }
    let stray_text = [root.text.as_deref(), child.borrow().tail.as_deref()]
        .into_iter()
        .flatten()
        .any(|text| !text.trim().is_empty());
    if stray_text {
        return Err(OdfError::InvalidMarkup(
            "Text outside the element".to_string(),
        ));
    }

    let child = Rc::clone(child);
    drop(root);
    detach(&child);
    child.borrow_mut().tail = None;
    Ok(ElementNode::from_node(child))
}
