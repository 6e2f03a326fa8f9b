#![forbid(unsafe_code)]

//! XML document abstraction for the Sigtuna signature policy library.
//!
//! Provides an owned document wrapper over `roxmltree`, a `NodeSet` for
//! document-subset serialization, and the minimal XPath subset used by
//! policy filter transforms.

pub mod document;
pub mod nodeset;
pub mod xpath;

pub use document::XmlDocument;
pub use nodeset::NodeSet;
