//! Utility types shared across the crate

pub mod datetime;

pub use datetime::OdfDateTime;
