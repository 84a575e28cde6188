//! ODF XML core module
//!
//! This module contains the namespace-aware element layer: name translation,
//! the element tree and its handles, parsing, serialization, path queries and
//! the lazily parsed part cache.

pub mod element;
pub mod error;
pub mod namespace;
pub mod node;
pub mod parser;
pub mod part;
pub mod qname;
pub mod serializer;
pub mod xpath;

pub use element::{create_element, ElementNode, InsertPosition};
pub use error::{OdfError, OdfResult};
pub use namespace::{ns, NamespaceRegistry};
pub use node::NamespaceDecl;
pub use parser::XmlParser;
pub use part::{Container, Document, MemoryContainer, XmlPart};
pub use qname::{decode, encode, native_form, prefixed_form, QName};
pub use serializer::{strip_namespace_declarations, XmlSerializer};
pub use xpath::{parse_query, LocationPath, NodeTest, PathEvaluator, Predicate, QueryEvaluator, Step};
