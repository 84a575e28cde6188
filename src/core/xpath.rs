//! Path queries over element trees
//!
//! Queries go through the [`QueryEvaluator`] trait, which receives the
//! context element, the query text and the namespace registry used to resolve
//! prefixes. [`PathEvaluator`] is the bundled implementation. It understands
//! XPath location paths built from:
//! - `/` and `//` separators, absolute or relative
//! - `name`, `prefix:name`, `*`, `prefix:*`, `.` and `..` steps
//! - `[n]`, `[last()]`, `[@attr]` and `[@attr='value']` predicates
//!
//! Positional predicates apply per context node, so `//text:p[1]` selects the
//! first paragraph child of every element that has one.

use crate::core::element::ElementNode;
use crate::core::error::{OdfError, OdfResult};
use crate::core::namespace::{ns, NamespaceRegistry};
use crate::core::node::{descendants, parent_of, root_of, NodeRef};
use crate::core::qname::{encode, QName};
use log::trace;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Evaluates a query string against a context element
pub trait QueryEvaluator {
    /// Return the matching elements in order
    fn evaluate(
        &self,
        context: &ElementNode,
        query: &str,
        namespaces: &NamespaceRegistry,
    ) -> OdfResult<Vec<ElementNode>>;
}

/// Built-in evaluator for XPath location paths
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator;

impl QueryEvaluator for PathEvaluator {
    fn evaluate(
        &self,
        context: &ElementNode,
        query: &str,
        namespaces: &NamespaceRegistry,
    ) -> OdfResult<Vec<ElementNode>> {
        let path = parse_query(query, namespaces)?;
        trace!("evaluating {:?} ({} steps)", query, path.steps.len());
        Ok(path.evaluate(context.node()))
    }
}

/// A parsed location path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPath {
    /// Whether the path starts at the document
    pub absolute: bool,
    /// Steps in order
    pub steps: Vec<Step>,
}

/// One step of a location path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Step was introduced by `//`
    pub descendant: bool,
    /// What the step selects
    pub test: NodeTest,
    /// Filters applied to the selection
    pub predicates: Vec<Predicate>,
}

/// Node test of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `.`
    SelfNode,
    /// `..`
    Parent,
    /// `*`
    AnyElement,
    /// `prefix:*`, holding the namespace URI
    Namespace(String),
    /// A name test, holding the native `{uri}local` name
    Name(String),
}

/// Step predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[n]`, 1-based
    Position(usize),
    /// `[last()]`
    Last,
    /// `[@name]`, holding the native attribute name
    HasAttribute(String),
    /// `[@name='value']`
    AttributeEquals(String, String),
}

/// Parse a query into a [`LocationPath`]
pub fn parse_query(query: &str, namespaces: &NamespaceRegistry) -> OdfResult<LocationPath> {
    let query = query.trim();
    if query.is_empty() {
        return Err(OdfError::InvalidQuery("Empty query".to_string()));
    }

    let (absolute, mut descendant, mut rest) = if let Some(rest) = query.strip_prefix("//") {
        (true, true, rest)
    } else if let Some(rest) = query.strip_prefix('/') {
        (true, false, rest)
    } else {
        (false, false, query)
    };

    let mut steps = Vec::new();
    if absolute && !descendant && rest.is_empty() {
        return Ok(LocationPath { absolute, steps });
    }

    loop {
        let end = step_end(rest)?;
        let text = &rest[..end];
        if text.trim().is_empty() {
            return Err(OdfError::InvalidQuery(format!("Empty step in '{}'", query)));
        }
        steps.push(parse_step(text.trim(), descendant, namespaces)?);

        rest = &rest[end..];
        if rest.is_empty() {
            break;
        }
        if let Some(next) = rest.strip_prefix("//") {
            descendant = true;
            rest = next;
        } else {
            descendant = false;
            rest = &rest[1..];
        }
        if rest.is_empty() {
            return Err(OdfError::InvalidQuery(format!("Trailing '/' in '{}'", query)));
        }
    }

    Ok(LocationPath { absolute, steps })
}

/// Byte offset of the next `/` outside brackets and quotes
fn step_end(text: &str) -> OdfResult<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| OdfError::InvalidQuery("Unexpected ']'".to_string()))?;
            }
            (None, '/') if depth == 0 => return Ok(i),
            _ => {}
        }
    }
    if quote.is_some() {
        return Err(OdfError::InvalidQuery("Unclosed quote".to_string()));
    }
    if depth > 0 {
        return Err(OdfError::InvalidQuery("Unclosed bracket".to_string()));
    }
    Ok(text.len())
}

fn parse_step(text: &str, descendant: bool, namespaces: &NamespaceRegistry) -> OdfResult<Step> {
    let (name, mut rest) = match text.find('[') {
        Some(i) => (text[..i].trim(), &text[i..]),
        None => (text, ""),
    };

    let test = match name {
        "." => NodeTest::SelfNode,
        ".." => NodeTest::Parent,
        "*" => NodeTest::AnyElement,
        _ => {
            check_name(name)?;
            match name.split_once(':') {
                Some((prefix, "*")) => NodeTest::Namespace(resolve_prefix(prefix, namespaces)?),
                Some((prefix, local)) => {
                    let uri = resolve_prefix(prefix, namespaces)?;
                    NodeTest::Name(encode(Some(uri.as_str()), local))
                }
                None => NodeTest::Name(name.to_string()),
            }
        }
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let Some(inner_rest) = rest.strip_prefix('[') else {
            return Err(OdfError::InvalidQuery(format!("Unexpected '{}' in step", rest)));
        };
        let close = predicate_end(inner_rest)?;
        predicates.push(parse_predicate(inner_rest[..close].trim(), namespaces)?);
        rest = inner_rest[close + 1..].trim_start();
    }

    if matches!(test, NodeTest::SelfNode | NodeTest::Parent) && !predicates.is_empty() {
        return Err(OdfError::InvalidQuery(format!(
            "Predicates are not allowed on '{}'",
            name
        )));
    }

    Ok(Step {
        descendant,
        test,
        predicates,
    })
}

/// Byte offset of the `]` closing a predicate, outside quotes
fn predicate_end(text: &str) -> OdfResult<usize> {
    let mut quote: Option<char> = None;
    for (i, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ']') => return Ok(i),
            (None, '[') => {
                return Err(OdfError::InvalidQuery(
                    "Nested predicates are not supported".to_string(),
                ))
            }
            _ => {}
        }
    }
    Err(OdfError::InvalidQuery("Unclosed bracket".to_string()))
}

fn parse_predicate(text: &str, namespaces: &NamespaceRegistry) -> OdfResult<Predicate> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        let position = text
            .parse()
            .map_err(|_| OdfError::InvalidQuery(format!("Invalid position: {}", text)))?;
        return Ok(Predicate::Position(position));
    }
    if text == "last()" {
        return Ok(Predicate::Last);
    }
    let Some(attribute) = text.strip_prefix('@') else {
        return Err(OdfError::InvalidQuery(format!(
            "Unsupported predicate: [{}]",
            text
        )));
    };

    match attribute.split_once('=') {
        None => Ok(Predicate::HasAttribute(attribute_name(attribute.trim(), namespaces)?)),
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .ok_or_else(|| {
                    OdfError::InvalidQuery(format!("Attribute value must be quoted: {}", value))
                })?;
            Ok(Predicate::AttributeEquals(
                attribute_name(name.trim(), namespaces)?,
                unquoted.to_string(),
            ))
        }
    }
}

fn attribute_name(name: &str, namespaces: &NamespaceRegistry) -> OdfResult<String> {
    check_name(name)?;
    match name.split_once(':') {
        Some((prefix, local)) => {
            let uri = resolve_prefix(prefix, namespaces)?;
            Ok(encode(Some(uri.as_str()), local))
        }
        None => Ok(name.to_string()),
    }
}

fn resolve_prefix(prefix: &str, namespaces: &NamespaceRegistry) -> OdfResult<String> {
    if prefix == ns::XML_PREFIX {
        return Ok(ns::XML.to_string());
    }
    namespaces.resolve(prefix).map(str::to_string)
}

fn check_name(name: &str) -> OdfResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '*'));
    if valid {
        Ok(())
    } else {
        Err(OdfError::InvalidQuery(format!("Unsupported step: {}", name)))
    }
}

/// A point in the tree a step starts from
#[derive(Clone)]
enum Context {
    /// The document node above a topmost element
    Document(NodeRef),
    /// A node
    Node(NodeRef),
}

impl Context {
    fn key(&self) -> (bool, *const ()) {
        match self {
            Context::Document(node) => (true, Rc::as_ptr(node) as *const ()),
            Context::Node(node) => Context::node_key(node),
        }
    }

    fn node_key(node: &NodeRef) -> (bool, *const ()) {
        (false, Rc::as_ptr(node) as *const ())
    }

    fn children(&self) -> Vec<NodeRef> {
        match self {
            Context::Document(root) => vec![Rc::clone(root)],
            Context::Node(node) => node.borrow().children.clone(),
        }
    }

    fn descendant_or_self(&self) -> Vec<Context> {
        let mut out = vec![self.clone()];
        let top = match self {
            Context::Document(root) => {
                out.push(Context::Node(Rc::clone(root)));
                root
            }
            Context::Node(node) => node,
        };
        out.extend(
            descendants(top)
                .into_iter()
                .filter(|n| n.borrow().is_element())
                .map(Context::Node),
        );
        out
    }
}

impl LocationPath {
    /// Evaluate from a context node
    pub(crate) fn evaluate(&self, context: &NodeRef) -> Vec<ElementNode> {
        let root = root_of(context);
        let mut contexts = if self.absolute {
            vec![Context::Document(Rc::clone(&root))]
        } else {
            vec![Context::Node(Rc::clone(context))]
        };
        let mut order = None;

        for step in &self.steps {
            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for context in &contexts {
                let bases = if step.descendant {
                    context.descendant_or_self()
                } else {
                    vec![context.clone()]
                };
                for base in bases {
                    for candidate in step.select(&base) {
                        if seen.insert(candidate.key()) {
                            next.push(candidate);
                        }
                    }
                }
            }
            if next.len() > 1 {
                let order = order.get_or_insert_with(|| document_order(&root));
                next.sort_by_key(|c| order.get(&c.key()).copied().unwrap_or(usize::MAX));
            }
            contexts = next;
        }

        contexts
            .into_iter()
            .filter_map(|context| match context {
                Context::Node(node) if node.borrow().is_element() => {
                    Some(ElementNode::from_node(node))
                }
                _ => None,
            })
            .collect()
    }
}

/// Rank of every node of the tree in document order, the document node first
fn document_order(root: &NodeRef) -> HashMap<(bool, *const ()), usize> {
    let mut order = HashMap::new();
    order.insert(Context::Document(Rc::clone(root)).key(), 0);
    order.insert(Context::node_key(root), 1);
    for (i, node) in descendants(root).iter().enumerate() {
        order.insert(Context::node_key(node), i + 2);
    }
    order
}

impl Step {
    fn select(&self, base: &Context) -> Vec<Context> {
        let candidates: Vec<Context> = match &self.test {
            NodeTest::SelfNode => vec![base.clone()],
            NodeTest::Parent => match base {
                Context::Document(_) => Vec::new(),
                Context::Node(node) => match parent_of(node) {
                    Some(parent) => vec![Context::Node(parent)],
                    None => vec![Context::Document(Rc::clone(node))],
                },
            },
            test => base
                .children()
                .into_iter()
                .filter(|child| test.matches(child))
                .map(Context::Node)
                .collect(),
        };

        self.predicates
            .iter()
            .fold(candidates, |candidates, predicate| predicate.filter(candidates))
    }
}

impl NodeTest {
    fn matches(&self, node: &NodeRef) -> bool {
        let data = node.borrow();
        let Some(element) = data.as_element() else {
            return false;
        };
        match self {
            NodeTest::AnyElement => true,
            NodeTest::Namespace(uri) => QName::split_native(&element.tag).0 == Some(uri.as_str()),
            NodeTest::Name(native) => element.tag == *native,
            NodeTest::SelfNode | NodeTest::Parent => false,
        }
    }
}

impl Predicate {
    fn filter(&self, candidates: Vec<Context>) -> Vec<Context> {
        match self {
            Predicate::Position(position) => position
                .checked_sub(1)
                .and_then(|index| candidates.into_iter().nth(index))
                .into_iter()
                .collect(),
            Predicate::Last => candidates.into_iter().last().into_iter().collect(),
            Predicate::HasAttribute(name) => candidates
                .into_iter()
                .filter(|c| attribute_of(c, name).is_some())
                .collect(),
            Predicate::AttributeEquals(name, value) => candidates
                .into_iter()
                .filter(|c| attribute_of(c, name).as_deref() == Some(value.as_str()))
                .collect(),
        }
    }
}

fn attribute_of(context: &Context, native: &str) -> Option<String> {
    let Context::Node(node) = context else {
        return None;
    };
    let data = node.borrow();
    data.as_element()?.get_attribute(native).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> &'static NamespaceRegistry {
        NamespaceRegistry::odf()
    }

    #[test]
    fn test_parse_descendant_path() {
        let path = parse_query("//text:p", registry()).unwrap();
        assert!(path.absolute);
        assert_eq!(path.steps.len(), 1);
        assert!(path.steps[0].descendant);
        assert_eq!(
            path.steps[0].test,
            NodeTest::Name(format!("{{{}}}p", ns::TEXT))
        );
    }

    #[test]
    fn test_parse_predicates() {
        let path = parse_query("office:body/text:p[@text:style-name='A/B'][2]", registry()).unwrap();
        assert!(!path.absolute);
        assert_eq!(path.steps.len(), 2);
        assert_eq!(
            path.steps[1].predicates,
            vec![
                Predicate::AttributeEquals(
                    format!("{{{}}}style-name", ns::TEXT),
                    "A/B".to_string()
                ),
                Predicate::Position(2),
            ]
        );
    }

    #[test]
    fn test_parse_namespace_wildcard_and_parent() {
        let path = parse_query("../style:*[last()]", registry()).unwrap();
        assert_eq!(path.steps[0].test, NodeTest::Parent);
        assert_eq!(path.steps[1].test, NodeTest::Namespace(ns::STYLE.to_string()));
        assert_eq!(path.steps[1].predicates, vec![Predicate::Last]);
    }

    #[test]
    fn test_parse_unknown_prefix() {
        assert!(matches!(
            parse_query("//nope:p", registry()),
            Err(OdfError::UnknownPrefix(_))
        ));
    }

    #[test]
    fn test_parse_invalid() {
        for query in ["", "//", "a/", "a[", "a]", "string(text:p)", "a[@b=c]", ".[1]"] {
            assert!(
                matches!(parse_query(query, registry()), Err(OdfError::InvalidQuery(_))),
                "query {:?} should be rejected",
                query
            );
        }
    }

    #[test]
    fn test_results_in_document_order() {
        let markup = format!(
            concat!(
                "<office:text xmlns:office=\"{}\" xmlns:text=\"{}\">",
                "<text:p>a</text:p><text:section><text:p>b</text:p></text:section><text:p>c</text:p>",
                "</office:text>"
            ),
            ns::OFFICE,
            ns::TEXT
        );
        let tree = crate::core::parser::XmlParser::new()
            .parse(markup.as_bytes())
            .unwrap();

        let paragraphs = parse_query("//text:p", registry()).unwrap().evaluate(&tree.root);
        let texts: Vec<String> = paragraphs.iter().map(ElementNode::text).collect();
        assert_eq!(texts, ["a", "b", "c"]);

        let parents = parse_query("//text:p/..", registry())
            .unwrap()
            .evaluate(paragraphs[2].node());
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0], ElementNode::from_node(Rc::clone(&tree.root)));
        assert_eq!(parents[1].local_name(), "section");
    }

    #[test]
    fn test_parse_root() {
        let path = parse_query("/", registry()).unwrap();
        assert!(path.absolute);
        assert!(path.steps.is_empty());
    }
}
