//! Namespace registry for ODF
//!
//! ODF parts bind a fixed, well-known set of prefixes to namespace URIs. This
//! module holds that table and answers prefix → URI and URI → prefix lookups.
//! The table is built once per process and never mutated afterwards, so
//! qualified-name translation is a pure function.

use crate::core::error::{OdfError, OdfResult};
use std::collections::HashMap;
use std::sync::OnceLock;

static ODF_REGISTRY: OnceLock<NamespaceRegistry> = OnceLock::new();

/// Built-in ODF namespaces
pub mod ns {
    /// Office namespace
    pub const OFFICE: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
    /// Style namespace
    pub const STYLE: &str = "urn:oasis:names:tc:opendocument:xmlns:style:1.0";
    /// Text namespace
    pub const TEXT: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
    /// Table namespace
    pub const TABLE: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
    /// Drawing namespace
    pub const DRAW: &str = "urn:oasis:names:tc:opendocument:xmlns:drawing:1.0";
    /// XSL-FO compatible namespace
    pub const FO: &str = "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0";
    /// XLink namespace
    pub const XLINK: &str = "http://www.w3.org/1999/xlink";
    /// Dublin Core namespace
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";
    /// Metadata namespace
    pub const META: &str = "urn:oasis:names:tc:opendocument:xmlns:meta:1.0";
    /// Data style namespace
    pub const NUMBER: &str = "urn:oasis:names:tc:opendocument:xmlns:datastyle:1.0";
    /// SVG compatible namespace
    pub const SVG: &str = "urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0";
    /// Chart namespace
    pub const CHART: &str = "urn:oasis:names:tc:opendocument:xmlns:chart:1.0";
    /// 3D drawing namespace
    pub const DR3D: &str = "urn:oasis:names:tc:opendocument:xmlns:dr3d:1.0";
    /// MathML namespace
    pub const MATH: &str = "http://www.w3.org/1998/Math/MathML";
    /// Form namespace
    pub const FORM: &str = "urn:oasis:names:tc:opendocument:xmlns:form:1.0";
    /// Script namespace
    pub const SCRIPT: &str = "urn:oasis:names:tc:opendocument:xmlns:script:1.0";
    /// OpenOffice general extensions
    pub const OOO: &str = "http://openoffice.org/2004/office";
    /// OpenOffice Writer extensions
    pub const OOOW: &str = "http://openoffice.org/2004/writer";
    /// OpenOffice Calc extensions
    pub const OOOC: &str = "http://openoffice.org/2004/calc";
    /// DOM events namespace
    pub const DOM: &str = "http://www.w3.org/2001/xml-events";
    /// XForms namespace
    pub const XFORMS: &str = "http://www.w3.org/2002/xforms";
    /// XML Schema namespace
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";
    /// XML Schema instance namespace
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
    /// Report namespace
    pub const RPT: &str = "http://openoffice.org/2005/report";
    /// OpenFormula namespace
    pub const OF: &str = "urn:oasis:names:tc:opendocument:xmlns:of:1.2";
    /// RDFa namespace
    pub const RDFA: &str = "http://docs.oasis-open.org/opendocument/meta/rdfa#";
    /// Configuration namespace
    pub const CONFIG: &str = "urn:oasis:names:tc:opendocument:xmlns:config:1.0";

    /// The `xml` prefix namespace, bound implicitly by every XML document
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Prefix reserved for [`XML`]
    pub const XML_PREFIX: &str = "xml";
}

/// (prefix, uri) pairs in declaration order
const ODF_NAMESPACES: &[(&str, &str)] = &[
    ("office", ns::OFFICE),
    ("style", ns::STYLE),
    ("text", ns::TEXT),
    ("table", ns::TABLE),
    ("draw", ns::DRAW),
    ("fo", ns::FO),
    ("xlink", ns::XLINK),
    ("dc", ns::DC),
    ("meta", ns::META),
    ("number", ns::NUMBER),
    ("svg", ns::SVG),
    ("chart", ns::CHART),
    ("dr3d", ns::DR3D),
    ("math", ns::MATH),
    ("form", ns::FORM),
    ("script", ns::SCRIPT),
    ("ooo", ns::OOO),
    ("ooow", ns::OOOW),
    ("oooc", ns::OOOC),
    ("dom", ns::DOM),
    ("xforms", ns::XFORMS),
    ("xsd", ns::XSD),
    ("xsi", ns::XSI),
    ("rpt", ns::RPT),
    ("of", ns::OF),
    ("rdfa", ns::RDFA),
    ("config", ns::CONFIG),
];

/// Fixed bidirectional prefix ↔ URI table
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    entries: Vec<(&'static str, &'static str)>,
    prefix_to_uri: HashMap<&'static str, &'static str>,
    uri_to_prefix: HashMap<&'static str, &'static str>,
}

impl NamespaceRegistry {
    /// The process-wide ODF namespace table
    pub fn odf() -> &'static NamespaceRegistry {
        ODF_REGISTRY.get_or_init(|| Self::from_entries(ODF_NAMESPACES))
    }

    fn from_entries(entries: &[(&'static str, &'static str)]) -> Self {
        let mut prefix_to_uri = HashMap::with_capacity(entries.len());
        let mut uri_to_prefix = HashMap::with_capacity(entries.len());
        for &(prefix, uri) in entries {
            prefix_to_uri.insert(prefix, uri);
            // First match wins for the reverse direction
            uri_to_prefix.entry(uri).or_insert(prefix);
        }
        Self {
            entries: entries.to_vec(),
            prefix_to_uri,
            uri_to_prefix,
        }
    }

    /// Get the URI bound to a prefix
    pub fn resolve(&self, prefix: &str) -> OdfResult<&'static str> {
        self.get_uri(prefix)
            .ok_or_else(|| OdfError::UnknownPrefix(prefix.to_string()))
    }

    /// Get the prefix bound to a URI
    pub fn prefix_for(&self, uri: &str) -> OdfResult<&'static str> {
        self.get_prefix(uri)
            .ok_or_else(|| OdfError::UnknownNamespace(uri.to_string()))
    }

    /// Non-failing form of [`resolve`](Self::resolve)
    pub fn get_uri(&self, prefix: &str) -> Option<&'static str> {
        self.prefix_to_uri.get(prefix).copied()
    }

    /// Non-failing form of [`prefix_for`](Self::prefix_for)
    pub fn get_prefix(&self, uri: &str) -> Option<&'static str> {
        self.uri_to_prefix.get(uri).copied()
    }

    /// Check if a prefix is registered
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefix_to_uri.contains_key(prefix)
    }

    /// Check if a URI is registered
    pub fn has_uri(&self, uri: &str) -> bool {
        self.uri_to_prefix.contains_key(uri)
    }

    /// Iterate over (prefix, uri) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of registered namespaces
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
