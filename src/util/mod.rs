//! Utility modules for xmldom.
//!
//! Contains the string interning dictionary and `QName` handling.

pub mod dict;
pub mod qname;
