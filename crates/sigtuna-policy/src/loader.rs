#![forbid(unsafe_code)]

//! Policy document loading with opaque fallback.
//!
//! Policy documents in the XAdES family are frequently plain text or
//! binary blobs rather than XML. Loading therefore never fails: input
//! that does not parse as well-formed, namespace-aware XML is kept as an
//! opaque byte stream and hashed as-is, without structural transforms.

use sigtuna_core::Error;
use sigtuna_xml::NodeSet;
use tracing::debug;

/// A policy document: structured when the input is well-formed XML,
/// opaque otherwise. The opaque state is permanent for a given instance;
/// nothing converts an opaque document back to structured form.
#[derive(Debug, Clone)]
pub enum PolicyDocument {
    /// A well-formed XML document. `node_set`, when present, records the
    /// nodes remaining after filter transforms; nodes outside it are
    /// excluded from serialization.
    Xml {
        text: String,
        node_set: Option<NodeSet>,
    },
    /// Raw bytes of a non-XML policy document.
    Opaque(Vec<u8>),
}

impl PolicyDocument {
    /// Parse raw policy bytes.
    ///
    /// Parsing is strict, namespace-aware, and secure (no DTDs, no
    /// external entities; the input is untrusted). Malformed markup and
    /// non-UTF-8 input fall back to the opaque variant.
    pub fn parse(raw: Vec<u8>) -> Self {
        let text = match std::str::from_utf8(&raw) {
            Ok(text) => text,
            Err(e) => {
                debug!("policy document is not UTF-8, treating as opaque: {e}");
                return Self::Opaque(raw);
            }
        };
        match roxmltree::Document::parse(text) {
            Ok(_) => Self::Xml {
                text: text.to_owned(),
                node_set: None,
            },
            Err(e) => {
                debug!("failed parsing policy document as XML, treating as opaque: {e}");
                Self::Opaque(raw)
            }
        }
    }

    /// Whether this document is the structured variant.
    pub fn is_xml(&self) -> bool {
        matches!(self, Self::Xml { .. })
    }

    /// Serialize the document to the byte sequence that gets digested.
    ///
    /// The structured variant is rendered physically, honoring the node
    /// set left behind by filter transforms; the opaque variant is
    /// returned unchanged.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        match self {
            Self::Xml { text, node_set } => {
                sigtuna_c14n::canonicalize(text, sigtuna_c14n::C14nMode::Physical, node_set.as_ref())
            }
            Self::Opaque(data) => Ok(data.clone()),
        }
    }
}
