#![forbid(unsafe_code)]

//! The policy transform pipeline.
//!
//! A signature declares the transforms that were applied to the policy
//! document before it was hashed. Verification must reproduce them in
//! declaration order: canonicalization transforms re-serialize the whole
//! working document, XPath filter transforms prune nodes from it, and
//! unrecognized transforms are skipped. Canonicalization failures are
//! fatal; an attacker who can degrade canonicalization can forge policy
//! conformance.

use crate::loader::PolicyDocument;
use sigtuna_c14n::C14nMode;
use sigtuna_core::{algorithm, Error};
use sigtuna_xml::{xpath::XPathExpr, NodeSet};
use tracing::{debug, warn};

/// Set operation of an XPath filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Subtract,
    Intersect,
    Union,
}

/// A single XPath filter: a set operation paired with an expression.
#[derive(Debug, Clone)]
pub struct XPath2Filter {
    pub op: FilterOp,
    pub xpath: String,
}

impl XPath2Filter {
    pub fn subtract(xpath: impl Into<String>) -> Self {
        Self {
            op: FilterOp::Subtract,
            xpath: xpath.into(),
        }
    }

    pub fn intersect(xpath: impl Into<String>) -> Self {
        Self {
            op: FilterOp::Intersect,
            xpath: xpath.into(),
        }
    }

    pub fn union(xpath: impl Into<String>) -> Self {
        Self {
            op: FilterOp::Union,
            xpath: xpath.into(),
        }
    }
}

/// A declared transform, resolved once from its algorithm URI.
#[derive(Debug, Clone)]
pub enum TransformAlgorithm {
    /// One of the seven recognized canonical-form algorithms.
    Canonicalize(C14nMode),
    /// An XPath Filter 2.0 transform with its filters in declared order.
    XPathFilter2(Vec<XPath2Filter>),
    /// Any other algorithm, identified only by URI; not actionable.
    Generic(String),
}

impl TransformAlgorithm {
    /// Resolve a transform from its algorithm URI. Unrecognized URIs
    /// become [`TransformAlgorithm::Generic`], never an error.
    pub fn from_uri(uri: &str) -> Self {
        match C14nMode::from_uri(uri) {
            Some(mode) => Self::Canonicalize(mode),
            None => Self::Generic(uri.to_owned()),
        }
    }

    /// The algorithm URI identifying this transform.
    pub fn uri(&self) -> &str {
        match self {
            Self::Canonicalize(mode) => mode.uri(),
            Self::XPathFilter2(_) => algorithm::XPATH2,
            Self::Generic(uri) => uri,
        }
    }
}

/// Apply the declared transforms, in order, to a policy document.
///
/// Opaque documents pass through unchanged: structural transforms are
/// only meaningful for XML. A non-empty transform list on an opaque
/// document is reported, since it usually means the signature and the
/// retrieved document disagree about what the policy is.
pub fn apply_transforms(
    document: PolicyDocument,
    transforms: &[TransformAlgorithm],
) -> Result<PolicyDocument, Error> {
    let (mut text, mut node_set) = match document {
        PolicyDocument::Opaque(data) => {
            if !transforms.is_empty() {
                warn!(
                    count = transforms.len(),
                    "policy document is not XML, declared transforms were ignored"
                );
            }
            return Ok(PolicyDocument::Opaque(data));
        }
        PolicyDocument::Xml { text, node_set } => (text, node_set),
    };

    for transform in transforms {
        match transform {
            TransformAlgorithm::Canonicalize(mode) => {
                debug!(uri = mode.uri(), "applying canonicalization transform");
                let bytes = sigtuna_c14n::canonicalize(&text, *mode, node_set.as_ref())?;
                text = String::from_utf8(bytes)
                    .map_err(|e| Error::XmlParse(format!("canonical output: {e}")))?;
                // Validate that the canonical bytes re-parse; later
                // transforms and the final serialization depend on it.
                roxmltree::Document::parse(&text)
                    .map_err(|e| Error::XmlParse(e.to_string()))?;
                node_set = None;
            }
            TransformAlgorithm::XPathFilter2(filters) => {
                debug!(count = filters.len(), "applying XPath filter transform");
                let doc = roxmltree::Document::parse(&text)
                    .map_err(|e| Error::XmlParse(e.to_string()))?;
                for filter in filters {
                    apply_filter(&doc, filter, &mut node_set)?;
                }
            }
            TransformAlgorithm::Generic(uri) => {
                warn!(uri, "unsupported transform algorithm, skipping");
            }
        }
    }

    Ok(PolicyDocument::Xml { text, node_set })
}

fn apply_filter(
    doc: &roxmltree::Document<'_>,
    filter: &XPath2Filter,
    node_set: &mut Option<NodeSet>,
) -> Result<(), Error> {
    match filter.op {
        FilterOp::Subtract => {
            let expr = XPathExpr::parse(&filter.xpath)?;
            let matched = expr.evaluate(doc);
            debug!(
                xpath = filter.xpath.as_str(),
                count = matched.len(),
                "subtract filter matched nodes"
            );
            if matched.is_empty() {
                return Ok(());
            }
            let set = node_set.get_or_insert_with(|| NodeSet::all(doc));
            for node in matched {
                set.remove_subtree(node);
            }
        }
        FilterOp::Intersect | FilterOp::Union => {
            // Recognized filter kinds this pipeline cannot evaluate yet.
            warn!(
                op = ?filter.op,
                xpath = filter.xpath.as_str(),
                "unsupported XPath filter operation, skipping"
            );
        }
    }
    Ok(())
}
