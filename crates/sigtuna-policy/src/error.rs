#![forbid(unsafe_code)]

//! Typed verification failures.
//!
//! Every kind carries the policy identifier so callers can correlate
//! failures with the signature under verification, and the kinds are
//! never collapsed: a digest mismatch is a security-relevant rejection,
//! while an unavailable policy may only warrant a retry against another
//! document source.

use crate::identifier::ObjectIdentifier;
use sigtuna_core::Error;

/// Failure outcomes of [`crate::verifier::PolicyVerifier::verify`].
#[derive(Debug, thiserror::Error)]
pub enum PolicyVerificationError {
    /// No document could be retrieved for the identifier.
    #[error("no policy document available for [{identifier}]")]
    PolicyUnavailable {
        identifier: ObjectIdentifier,
        #[source]
        source: Option<Error>,
    },

    /// Loading, transforming, or re-serializing the policy document failed.
    #[error("policy transform failed for [{identifier}]")]
    TransformFailure {
        identifier: ObjectIdentifier,
        #[source]
        source: Error,
    },

    /// The computed digest differs from the value declared in the
    /// signature. Never retried.
    #[error("policy digest mismatch for [{identifier}]")]
    DigestMismatch { identifier: ObjectIdentifier },

    /// The declared digest algorithm is not supported.
    #[error("cannot digest policy [{identifier}]")]
    CannotDigest {
        identifier: ObjectIdentifier,
        #[source]
        source: Error,
    },
}

impl PolicyVerificationError {
    /// The identifier of the policy this failure concerns.
    pub fn identifier(&self) -> &ObjectIdentifier {
        match self {
            Self::PolicyUnavailable { identifier, .. }
            | Self::TransformFailure { identifier, .. }
            | Self::DigestMismatch { identifier }
            | Self::CannotDigest { identifier, .. } => identifier,
        }
    }
}
