//! Qualified-name codec
//!
//! Clients address elements and attributes as `prefix:local`. The tree stores
//! names in expanded form, `{uri}local`, so that lookups do not depend on
//! whichever prefix a given document happened to declare. This module
//! translates between the two using the [`NamespaceRegistry`].

use crate::core::error::OdfResult;
use crate::core::namespace::{ns, NamespaceRegistry};
use std::fmt;

/// A namespace URI (possibly absent) and a local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI, `None` for unprefixed names
    pub uri: Option<String>,
    /// Local part of the name
    pub local: String,
}

impl QName {
    /// Create a qualified name from its parts
    pub fn new(uri: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            uri: uri.map(str::to_string),
            local: local.into(),
        }
    }

    /// Decode a `prefix:local` name
    pub fn decode(qname: &str) -> OdfResult<Self> {
        decode(qname)
    }

    /// Expanded `{uri}local` form as stored in the tree
    pub fn native(&self) -> String {
        encode(self.uri.as_deref(), &self.local)
    }

    /// Split a native `{uri}local` name without allocating
    pub fn split_native(native: &str) -> (Option<&str>, &str) {
        if let Some(rest) = native.strip_prefix('{') {
            if let Some((uri, local)) = rest.split_once('}') {
                return (Some(uri), local);
            }
        }
        (None, native)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.uri {
            Some(uri) => write!(f, "{{{}}}{}", uri, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Turn a `prefix:local` name into a (uri, local) pair
///
/// Names without a colon have no namespace. The `xml` prefix is always bound
/// to the XML namespace.
pub fn decode(qname: &str) -> OdfResult<QName> {
    let Some((prefix, local)) = qname.split_once(':') else {
        return Ok(QName::new(None, qname));
    };
    let uri = if prefix == ns::XML_PREFIX {
        ns::XML
    } else {
        NamespaceRegistry::odf().resolve(prefix)?
    };
    Ok(QName::new(Some(uri), local))
}

/// Render the tree-native form of a name
pub fn encode(uri: Option<&str>, local: &str) -> String {
    match uri {
        Some(uri) => format!("{{{}}}{}", uri, local),
        None => local.to_string(),
    }
}

/// Shorthand for `encode(decode(qname))`
pub fn native_form(qname: &str) -> OdfResult<String> {
    decode(qname).map(|q| q.native())
}

/// Replace the `{uri}local` syntax with `prefix:local`
pub fn prefixed_form(native: &str) -> OdfResult<String> {
    match QName::split_native(native) {
        (Some(uri), local) => {
            let prefix = if uri == ns::XML {
                ns::XML_PREFIX
            } else {
                NamespaceRegistry::odf().prefix_for(uri)?
            };
            Ok(format!("{}:{}", prefix, local))
        }
        (None, local) => Ok(local.to_string()),
    }
}
