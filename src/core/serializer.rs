//! ODF XML serializer
//!
//! This module renders node trees back to markup. Prefixes come from the
//! namespace declarations in scope; a name whose URI is not declared anywhere
//! above it gets a declaration on the element using the registry prefix.
//!
//! Start tags and character data that are still exactly as parsed are written
//! from their source markup, so an unedited part reproduces its bytes.
//!
//! Fragment output is passed through a declaration-stripping pattern:
//! fragments are built inside a template that declares every ODF namespace,
//! so declarations on emitted fragments are redundant noise. Whole-document
//! output keeps its declarations.

use crate::core::error::OdfResult;
use crate::core::namespace::{ns, NamespaceRegistry};
use crate::core::node::{in_scope_namespaces, NamespaceDecl, NodeKind, NodeRef};
use crate::core::qname::QName;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::OnceLock;

static NS_STRIPPER: OnceLock<Regex> = OnceLock::new();

const INDENT: &str = "  ";

fn ns_stripper() -> &'static Regex {
    NS_STRIPPER.get_or_init(|| {
        Regex::new(r#" xmlns:\w*="[\w:\-/\.#]*""#).expect("namespace stripping pattern is valid")
    })
}

/// Remove every ` xmlns:prefix="uri"` declaration from serialized markup
pub fn strip_namespace_declarations(markup: &str) -> String {
    ns_stripper().replace_all(markup, "").into_owned()
}

/// Escape character data (`&`, `<`, `>`)
pub(crate) fn escape_text(text: &str) -> String {
    partial_escape(text).into_owned()
}

/// Escape an attribute value for a double-quoted attribute
fn escape_attribute(value: &str) -> String {
    partial_escape(value)
        .replace('"', "&quot;")
        .replace('\t', "&#9;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Serializer for node trees
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer {
    pretty: bool,
}

impl XmlSerializer {
    /// Create a compact serializer
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Create a serializer that indents element-only content
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Serialize a whole document: prolog, root element, epilog
    ///
    /// Compact output writes the prolog and epilog verbatim. Pretty output
    /// trims the whitespace around them and ends with a newline.
    pub(crate) fn serialize_document(
        &self,
        root: &NodeRef,
        prolog: &str,
        epilog: &str,
    ) -> OdfResult<Vec<u8>> {
        let body = self.write_tree(root, None)?;

        let mut out = Vec::with_capacity(prolog.len() + body.len() + epilog.len() + 2);
        if self.pretty {
            let prolog = prolog.trim();
            if !prolog.is_empty() {
                out.extend_from_slice(prolog.as_bytes());
                out.push(b'\n');
            }
            out.extend_from_slice(&body);
            out.push(b'\n');
            let epilog = epilog.trim();
            if !epilog.is_empty() {
                out.extend_from_slice(epilog.as_bytes());
                out.push(b'\n');
            }
        } else {
            out.extend_from_slice(prolog.as_bytes());
            out.extend_from_slice(&body);
            out.extend_from_slice(epilog.as_bytes());
        }
        Ok(out)
    }

    /// Serialize a subtree as a standalone fragment
    ///
    /// The root's tail is not part of the fragment. Namespace declarations are
    /// stripped from the result.
    pub(crate) fn serialize_fragment(&self, node: &NodeRef) -> OdfResult<Vec<u8>> {
        // Everything in scope is declared on the fragment root so the
        // unstripped markup would be standalone
        let inherited = in_scope_namespaces(node);
        let raw = self.write_tree(node, Some(inherited))?;
        let markup = String::from_utf8_lossy(&raw);
        Ok(strip_namespace_declarations(&markup).into_bytes())
    }

    fn write_tree(
        &self,
        root: &NodeRef,
        root_declarations: Option<Vec<NamespaceDecl>>,
    ) -> OdfResult<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let mut scope = Vec::new();
        self.write_node(&mut writer, root, &mut scope, root_declarations, 0)?;
        Ok(writer.into_inner().into_inner())
    }

    /// Write one node and its subtree (not its tail)
    ///
    /// `declarations` replaces the element's own declarations; it is only set
    /// for the subtree root.
    fn write_node(
        &self,
        writer: &mut XmlWriter,
        node: &NodeRef,
        scope: &mut Vec<NamespaceDecl>,
        declarations: Option<Vec<NamespaceDecl>>,
        depth: usize,
    ) -> OdfResult<()> {
        let data = node.borrow();
        let element = match &data.kind {
            NodeKind::Comment(content) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(content.as_str())))?;
                return Ok(());
            }
            NodeKind::ProcessingInstruction(content) => {
                writer.write_event(Event::PI(BytesPI::new(content.as_str())))?;
                return Ok(());
            }
            NodeKind::Element(element) => element,
        };

        let scope_len = scope.len();
        let own_declarations = declarations.is_none();
        let mut declared = match declarations {
            Some(declarations) => declarations,
            None => element.namespaces.clone(),
        };
        scope.extend(declared.iter().cloned());

        let tag = prefixed_name(&element.tag, true, scope, &mut declared)?;
        let mut attributes = Vec::with_capacity(element.attributes.len());
        for (native, value) in &element.attributes {
            let name = prefixed_name(native, false, scope, &mut declared)?;
            attributes.push((name, value.as_str()));
        }

        // The source tag stays valid while it renders the same names and
        // needs no extra declarations
        let source = element.unchanged_source().filter(|source| {
            own_declarations
                && declared.len() == element.namespaces.len()
                && source.name == tag
                && source
                    .attribute_names
                    .iter()
                    .eq(attributes.iter().map(|(name, _)| name))
        });
        let start = match source {
            Some(source) => BytesStart::from_content(source.markup.as_str(), source.name.len()),
            None => {
                let mut content = tag.clone();
                for decl in &declared {
                    match &decl.prefix {
                        Some(prefix) => content.push_str(&format!(" xmlns:{}=\"", prefix)),
                        None => content.push_str(" xmlns=\""),
                    }
                    content.push_str(&escape_attribute(&decl.uri));
                    content.push('"');
                }
                for (name, value) in &attributes {
                    content.push(' ');
                    content.push_str(name);
                    content.push_str("=\"");
                    content.push_str(&escape_attribute(value));
                    content.push('"');
                }
                BytesStart::from_content(content, tag.len())
            }
        };

        if data.text.is_none() && data.children.is_empty() && !element.explicit_end {
            writer.write_event(Event::Empty(start))?;
            scope.truncate(scope_len);
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(text) = &data.text {
            write_text(writer, text, data.verbatim_text())?;
        }

        let indent = self.pretty
            && data.text.is_none()
            && data.children.iter().all(|child| child.borrow().tail.is_none());
        for child in &data.children {
            if indent {
                let newline = format!("\n{}", INDENT.repeat(depth + 1));
                writer.write_event(Event::Text(BytesText::from_escaped(newline)))?;
            }
            self.write_node(writer, child, scope, None, depth + 1)?;
            let child = child.borrow();
            if let Some(tail) = &child.tail {
                write_text(writer, tail, child.verbatim_tail())?;
            }
        }
        if indent {
            let newline = format!("\n{}", INDENT.repeat(depth));
            writer.write_event(Event::Text(BytesText::from_escaped(newline)))?;
        }

        writer.write_event(Event::End(BytesEnd::new(tag)))?;
        scope.truncate(scope_len);
        Ok(())
    }
}

fn write_text(writer: &mut XmlWriter, text: &str, source: Option<&str>) -> OdfResult<()> {
    let markup = match source {
        Some(markup) => Cow::Borrowed(markup),
        None => Cow::Owned(escape_text(text)),
    };
    writer.write_event(Event::Text(BytesText::from_escaped(markup)))?;
    Ok(())
}

/// Render a native name with a prefix bound in `scope`
///
/// When no usable binding exists, the registry prefix is declared on the
/// current element (added to both `scope` and `declared`).
fn prefixed_name(
    native: &str,
    is_element: bool,
    scope: &mut Vec<NamespaceDecl>,
    declared: &mut Vec<NamespaceDecl>,
) -> OdfResult<String> {
    let (uri, local) = QName::split_native(native);
    let Some(uri) = uri else {
        // An unqualified element under a default namespace needs it undone
        if is_element && default_namespace(scope).is_some_and(|uri| !uri.is_empty()) {
            let decl = NamespaceDecl::new(None, "");
            scope.push(decl.clone());
            declared.push(decl);
        }
        return Ok(local.to_string());
    };
    if uri == ns::XML {
        return Ok(format!("{}:{}", ns::XML_PREFIX, local));
    }

    let mut shadowed = HashSet::new();
    for decl in scope.iter().rev() {
        if !shadowed.insert(decl.prefix.clone()) {
            continue;
        }
        if decl.uri != uri {
            continue;
        }
        match &decl.prefix {
            Some(prefix) => return Ok(format!("{}:{}", prefix, local)),
            None if is_element => return Ok(local.to_string()),
            None => {}
        }
    }

    let prefix = NamespaceRegistry::odf().prefix_for(uri)?;
    let decl = NamespaceDecl::new(Some(prefix), uri);
    scope.push(decl.clone());
    declared.push(decl);
    Ok(format!("{}:{}", prefix, local))
}

fn default_namespace(scope: &[NamespaceDecl]) -> Option<&str> {
    scope
        .iter()
        .rev()
        .find(|decl| decl.prefix.is_none())
        .map(|decl| decl.uri.as_str())
}
