//! # odfxml
//!
//! Namespace-aware XML element layer for OpenDocument (ODF) packages.
//!
//! ODF parts use a fixed set of well-known namespace prefixes. This crate lets
//! callers address elements and attributes as `prefix:local`, query parts with
//! XPath location paths, edit the tree in place and write it back out.
//!
//! ## Quick start
//!
//! ```rust
//! use odfxml::{create_element, InsertPosition, MemoryContainer, XmlPart};
//!
//! let content = r#"<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><text:p>Hello</text:p></office:body></office:document-content>"#;
//! let container = MemoryContainer::new().with_part("content.xml", content);
//! let part = XmlPart::new("content.xml", container);
//!
//! let paragraph = part.get_element("//text:p").unwrap().unwrap();
//! assert_eq!(paragraph.text(), "Hello");
//!
//! let span = create_element("<text:span>world</text:span>").unwrap();
//! paragraph.insert(&span, InsertPosition::LastChild).unwrap();
//! assert_eq!(
//!     paragraph.serialize().unwrap(),
//!     b"<text:p>Hello<text:span>world</text:span></text:p>"
//! );
//! ```
//!
//! ## Logging
//!
//! The crate reports through the [`log`] facade: part fetches at `debug`,
//! query evaluation at `trace`. Install any logger to see them.

pub mod core;
pub mod utils;

pub use crate::core::{
    create_element, ns, Container, Document, ElementNode, InsertPosition, MemoryContainer,
    NamespaceRegistry, OdfError, OdfResult, PathEvaluator, QName, QueryEvaluator, XmlPart,
};
pub use crate::utils::OdfDateTime;
