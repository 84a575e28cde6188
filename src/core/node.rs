//! Tree storage
//!
//! This module defines the node types backing every parsed part and every
//! standalone fragment:
//! - NodeKind: an element, a comment, or a processing instruction
//! - ElementData: native tag, ordered attributes and namespace declarations
//! - NodeData: the kind plus leading text, tail text, parent and children
//!
//! Nodes are shared (`Rc<RefCell<_>>`) so several handles can alias one node
//! and see each other's edits. Parents are held weakly. Text follows the
//! "text + tail" model: an element's `text` is the character data before its
//! first child, and each child's `tail` is the character data between the end
//! of that child and the next sibling.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared handle to a node
pub(crate) type NodeRef = Rc<RefCell<NodeData>>;

/// A namespace declaration made on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix, `None` for a default namespace declaration
    pub prefix: Option<String>,
    /// Namespace URI
    pub uri: String,
}

impl NamespaceDecl {
    /// Create a namespace declaration
    pub fn new(prefix: Option<&str>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            uri: uri.into(),
        }
    }
}

/// Character data as written in the source, with the value it decodes to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Verbatim {
    pub(crate) value: String,
    pub(crate) markup: String,
}

/// A start tag as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceTag {
    /// Everything between `<` and `>` (or `/>`)
    pub(crate) markup: String,
    /// Qualified tag name as written
    pub(crate) name: String,
    /// Qualified attribute names as written, declarations excluded
    pub(crate) attribute_names: Vec<String>,
    /// Attributes the markup decodes to
    pub(crate) attributes: Vec<(String, String)>,
    /// Declarations the markup makes
    pub(crate) namespaces: Vec<NamespaceDecl>,
}

/// Element payload
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// Tag in native `{uri}local` form
    pub tag: String,
    /// Attributes keyed by native name, in document order
    pub attributes: Vec<(String, String)>,
    /// Namespace declarations made on this element, in document order
    pub namespaces: Vec<NamespaceDecl>,
    pub(crate) source: Option<SourceTag>,
    /// Source wrote the element as `<a></a>` rather than `<a/>`
    pub(crate) explicit_end: bool,
}

impl ElementData {
    /// Create an element payload with the given native tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Get an attribute value by native name
    pub fn get_attribute(&self, native: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == native)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, native: impl Into<String>, value: impl Into<String>) {
        let native = native.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == native) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((native, value)),
        }
    }

    /// Source start tag, while attributes and declarations are unedited
    pub(crate) fn unchanged_source(&self) -> Option<&SourceTag> {
        self.source
            .as_ref()
            .filter(|source| {
                source.attributes == self.attributes && source.namespaces == self.namespaces
            })
    }

    /// Remove an attribute, returning its value if it existed
    pub fn remove_attribute(&mut self, native: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == native)?;
        Some(self.attributes.remove(index).1)
    }
}

/// Kind of a tree node
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// An element
    Element(ElementData),
    /// A comment, content without the `<!--` `-->` delimiters
    Comment(String),
    /// A processing instruction, content without the `<?` `?>` delimiters
    ProcessingInstruction(String),
}

/// A node in the tree
#[derive(Debug)]
pub struct NodeData {
    /// What this node is
    pub kind: NodeKind,
    /// Leading character data (elements only)
    pub text: Option<String>,
    /// Character data following this node inside its parent
    pub tail: Option<String>,
    pub(crate) text_source: Option<Verbatim>,
    pub(crate) tail_source: Option<Verbatim>,
    pub(crate) parent: Weak<RefCell<NodeData>>,
    pub(crate) children: Vec<NodeRef>,
}

impl NodeData {
    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    /// Get the element payload, if this is an element node
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Get a mutable reference to the element payload
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Source markup of `text` while it still holds the parsed value
    pub(crate) fn verbatim_text(&self) -> Option<&str> {
        verbatim(self.text.as_deref(), self.text_source.as_ref())
    }

    /// Source markup of `tail` while it still holds the parsed value
    pub(crate) fn verbatim_tail(&self) -> Option<&str> {
        verbatim(self.tail.as_deref(), self.tail_source.as_ref())
    }
}

fn verbatim<'a>(value: Option<&str>, source: Option<&'a Verbatim>) -> Option<&'a str> {
    match (value, source) {
        (Some(value), Some(source)) if source.value == value => Some(source.markup.as_str()),
        _ => None,
    }
}

/// Create a parentless node
pub(crate) fn new_node(kind: NodeKind) -> NodeRef {
    Rc::new(RefCell::new(NodeData {
        kind,
        text: None,
        tail: None,
        text_source: None,
        tail_source: None,
        parent: Weak::new(),
        children: Vec::new(),
    }))
}

pub(crate) fn parent_of(node: &NodeRef) -> Option<NodeRef> {
    node.borrow().parent.upgrade()
}

/// Position of `child` among the children of `parent`
pub(crate) fn child_index(parent: &NodeRef, child: &NodeRef) -> Option<usize> {
    parent
        .borrow()
        .children
        .iter()
        .position(|c| Rc::ptr_eq(c, child))
}

/// Unlink a node from its parent; a no-op for parentless nodes
pub(crate) fn detach(node: &NodeRef) {
    let Some(parent) = parent_of(node) else {
        return;
    };
    if let Some(index) = child_index(&parent, node) {
        parent.borrow_mut().children.remove(index);
    }
    node.borrow_mut().parent = Weak::new();
}

/// Insert `child` at `index` among the children of `parent`
///
/// The child must already be detached.
pub(crate) fn insert_child(parent: &NodeRef, index: usize, child: &NodeRef) {
    child.borrow_mut().parent = Rc::downgrade(parent);
    let mut parent = parent.borrow_mut();
    let index = index.min(parent.children.len());
    parent.children.insert(index, Rc::clone(child));
}

/// Whether `candidate` is `node` or one of its ancestors
pub(crate) fn is_ancestor_or_self(candidate: &NodeRef, node: &NodeRef) -> bool {
    let mut current = Some(Rc::clone(node));
    while let Some(n) = current {
        if Rc::ptr_eq(&n, candidate) {
            return true;
        }
        current = parent_of(&n);
    }
    false
}

/// Topmost ancestor of a node (the node itself when parentless)
pub(crate) fn root_of(node: &NodeRef) -> NodeRef {
    let mut current = Rc::clone(node);
    while let Some(parent) = parent_of(&current) {
        current = parent;
    }
    current
}

/// Namespace declarations visible at `node`, outermost first
///
/// Declarations made on `node` itself are included.
pub(crate) fn in_scope_namespaces(node: &NodeRef) -> Vec<NamespaceDecl> {
    let mut chain = Vec::new();
    let mut current = Some(Rc::clone(node));
    while let Some(n) = current {
        if let Some(element) = n.borrow().as_element() {
            chain.push(element.namespaces.clone());
        }
        current = parent_of(&n);
    }
    chain.into_iter().rev().flatten().collect()
}

/// Deep copy of a subtree, detached from any parent
pub(crate) fn deep_clone(node: &NodeRef) -> NodeRef {
    let source = node.borrow();
    let copy = new_node(source.kind.clone());
    {
        let mut target = copy.borrow_mut();
        target.text = source.text.clone();
        target.tail = source.tail.clone();
        target.text_source = source.text_source.clone();
        target.tail_source = source.tail_source.clone();
    }
    for child in &source.children {
        let child_copy = deep_clone(child);
        let len = copy.borrow().children.len();
        insert_child(&copy, len, &child_copy);
    }
    copy
}

/// Descendant nodes of `node` in document order, excluding `node`
pub(crate) fn descendants(node: &NodeRef) -> Vec<NodeRef> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeRef> = node.borrow().children.iter().rev().cloned().collect();
    while let Some(n) = stack.pop() {
        stack.extend(n.borrow().children.iter().rev().cloned());
        out.push(n);
    }
    out
}

/// Concatenated character data of a subtree, excluding the root's tail
pub(crate) fn string_value(node: &NodeRef) -> String {
    let mut out = String::new();
    collect_string_value(node, &mut out);
    out
}

fn collect_string_value(node: &NodeRef, out: &mut String) {
    let data = node.borrow();
    if !data.is_element() {
        return;
    }
    if let Some(text) = &data.text {
        out.push_str(text);
    }
    for child in &data.children {
        collect_string_value(child, out);
        if let Some(tail) = &child.borrow().tail {
            out.push_str(tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str) -> NodeRef {
        new_node(NodeKind::Element(ElementData::new(tag)))
    }

    fn append(parent: &NodeRef, child: &NodeRef) {
        let len = parent.borrow().children.len();
        insert_child(parent, len, child);
    }

    #[test]
    fn test_attribute_order_and_replace() {
        let mut data = ElementData::new("p");
        data.set_attribute("a", "1");
        data.set_attribute("b", "2");
        data.set_attribute("a", "3");
        assert_eq!(
            data.attributes,
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
        assert_eq!(data.remove_attribute("a").as_deref(), Some("3"));
        assert_eq!(data.remove_attribute("a"), None);
    }

    #[test]
    fn test_source_tag_tracks_edits() {
        let mut data = ElementData::new("p");
        data.set_attribute("a", "it's");
        data.source = Some(SourceTag {
            markup: "p a='it&apos;s'".to_string(),
            name: "p".to_string(),
            attribute_names: vec!["a".to_string()],
            attributes: data.attributes.clone(),
            namespaces: Vec::new(),
        });
        assert!(data.unchanged_source().is_some());

        data.set_attribute("a", "other");
        assert!(data.unchanged_source().is_none());
        data.set_attribute("a", "it's");
        assert!(data.unchanged_source().is_some());
    }

    #[test]
    fn test_verbatim_text_follows_value() {
        let node = element("p");
        {
            let mut data = node.borrow_mut();
            data.text = Some("caf\u{e9}".to_string());
            data.text_source = Some(Verbatim {
                value: "caf\u{e9}".to_string(),
                markup: "caf&#233;".to_string(),
            });
        }
        assert_eq!(node.borrow().verbatim_text(), Some("caf&#233;"));
        assert_eq!(node.borrow().verbatim_tail(), None);

        node.borrow_mut().text = Some("tea".to_string());
        assert_eq!(node.borrow().verbatim_text(), None);
    }

    #[test]
    fn test_insert_and_detach() {
        let parent = element("p");
        let child = element("span");
        append(&parent, &child);
        assert!(Rc::ptr_eq(&parent_of(&child).unwrap(), &parent));
        assert_eq!(child_index(&parent, &child), Some(0));

        detach(&child);
        assert!(parent_of(&child).is_none());
        assert!(parent.borrow().children.is_empty());
    }

    #[test]
    fn test_ancestry() {
        let a = element("a");
        let b = element("b");
        let c = element("c");
        append(&a, &b);
        append(&b, &c);
        assert!(is_ancestor_or_self(&a, &c));
        assert!(is_ancestor_or_self(&c, &c));
        assert!(!is_ancestor_or_self(&c, &a));
        assert!(Rc::ptr_eq(&root_of(&c), &a));
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let a = element("a");
        let b = element("b");
        b.borrow_mut().tail = Some("tail".to_string());
        append(&a, &b);

        let copy = deep_clone(&a);
        assert!(parent_of(&copy).is_none());
        let copied_child = Rc::clone(&copy.borrow().children[0]);
        assert_eq!(copied_child.borrow().tail.as_deref(), Some("tail"));
        assert!(Rc::ptr_eq(&parent_of(&copied_child).unwrap(), &copy));

        copied_child.borrow_mut().tail = None;
        assert_eq!(b.borrow().tail.as_deref(), Some("tail"));
    }

    #[test]
    fn test_string_value() {
        let p = element("p");
        p.borrow_mut().text = Some("Hello ".to_string());
        let span = element("span");
        span.borrow_mut().text = Some("big".to_string());
        span.borrow_mut().tail = Some(" world".to_string());
        append(&p, &span);
        p.borrow_mut().tail = Some("ignored".to_string());
        assert_eq!(string_value(&p), "Hello big world");
    }

    #[test]
    fn test_in_scope_namespaces_outermost_first() {
        let a = element("a");
        a.borrow_mut()
            .as_element_mut()
            .unwrap()
            .namespaces
            .push(NamespaceDecl::new(Some("x"), "urn:x"));
        let b = element("b");
        b.borrow_mut()
            .as_element_mut()
            .unwrap()
            .namespaces
            .push(NamespaceDecl::new(Some("y"), "urn:y"));
        append(&a, &b);
        let scope = in_scope_namespaces(&b);
        assert_eq!(scope[0].prefix.as_deref(), Some("x"));
        assert_eq!(scope[1].prefix.as_deref(), Some("y"));
    }
}
