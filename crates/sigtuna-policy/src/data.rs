#![forbid(unsafe_code)]

//! Policy data carried by a signature's policy-identifier property.

use crate::identifier::ObjectIdentifier;
use crate::transform::TransformAlgorithm;

/// A digest algorithm URI paired with the expected digest value the
/// transformed policy document must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSpec {
    /// Digest algorithm URI.
    pub algorithm: String,
    /// Expected digest bytes.
    pub value: Vec<u8>,
}

impl DigestSpec {
    pub fn new(algorithm: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            value,
        }
    }
}

/// The signature policy a signature commits to.
///
/// An implied policy carries no identifier and nothing to verify; it is
/// a valid terminal outcome, not an error.
#[derive(Debug, Clone)]
pub enum SignaturePolicy {
    /// The policy is implied by context; no document is referenced.
    Implied,
    /// An explicit, identified policy.
    Identified(SignaturePolicyData),
}

/// Data of an explicit policy reference: identifier, declared transforms
/// (in application order), expected digest, and an optional location URL.
#[derive(Debug, Clone)]
pub struct SignaturePolicyData {
    pub identifier: ObjectIdentifier,
    pub transforms: Vec<TransformAlgorithm>,
    pub digest: DigestSpec,
    pub location_url: Option<String>,
}

impl SignaturePolicyData {
    pub fn new(identifier: ObjectIdentifier, digest: DigestSpec) -> Self {
        Self {
            identifier,
            transforms: Vec::new(),
            digest,
            location_url: None,
        }
    }

    /// Append a transform; transforms apply in the order added.
    pub fn with_transform(mut self, transform: TransformAlgorithm) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Record a URL where a copy of the policy may be obtained. Carried
    /// through to the verified result unchanged, not re-validated.
    pub fn with_location_url(mut self, url: impl Into<String>) -> Self {
        self.location_url = Some(url.into());
        self
    }
}

/// A successfully verified policy reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPolicy {
    pub identifier: ObjectIdentifier,
    pub location_url: Option<String>,
}

/// Terminal success states of policy verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyVerificationOutcome {
    /// The signature declared an implied policy.
    Implied,
    /// The referenced policy document matched its expected digest.
    Verified(VerifiedPolicy),
}
