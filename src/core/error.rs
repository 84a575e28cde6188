//! Error types for ODF XML operations
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Error types for ODF XML operations
#[derive(Debug, Error)]
pub enum OdfError {
    /// A `prefix:local` name used a prefix with no namespace entry
    #[error("Unknown namespace prefix: {0}")]
    UnknownPrefix(String),

    /// A namespace URI has no registered prefix
    #[error("Unknown namespace URI: {0}")]
    UnknownNamespace(String),

    /// Fragment markup was empty or could not be parsed
    #[error("Invalid markup: {0}")]
    InvalidMarkup(String),

    /// Deleting an attribute the element does not carry
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// The node passed as a child has a different parent
    #[error("Element is not a child of this element")]
    NotAChild,

    /// A sibling insertion was requested on an element without a parent
    #[error("Element has no parent")]
    NoParent,

    /// Inserting an element into itself or one of its descendants
    #[error("Cannot insert an element into itself or its descendants")]
    CyclicInsert,

    /// The container has no part with this name
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// The part bytes are not well-formed XML
    #[error("Malformed part '{part}': {reason}")]
    MalformedPart { part: String, reason: String },

    /// The query is outside what the evaluator understands
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Bad value provided (e.g., a malformed date)
    #[error("Bad value: {0}")]
    BadValue(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for ODF XML operations
pub type OdfResult<T> = Result<T, OdfError>;
