#![forbid(unsafe_code)]

//! Collaborator interfaces: policy document retrieval and digest engines.

use crate::identifier::ObjectIdentifier;
use sigtuna_core::Error;
use sigtuna_crypto::DigestAlgorithm;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use tracing::{debug, warn};

/// Supplies raw policy document bytes for an identifier.
///
/// Absence is a legitimate, typed outcome (the provider simply does not
/// know this policy), distinct from an implied policy.
pub trait PolicyDocumentProvider {
    fn policy_document_stream(&self, id: &ObjectIdentifier) -> Option<Box<dyn Read + '_>>;
}

/// A [`PolicyDocumentProvider`] backed by a pre-populated in-memory map,
/// keyed by identifier value.
///
/// Registration must complete before verification calls begin; the
/// lookup side takes `&self` and is safe for concurrent readers.
#[derive(Debug, Default)]
pub struct InMemoryPolicyProvider {
    files: HashMap<String, Vec<u8>>,
}

impl InMemoryPolicyProvider {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Register a policy document under its identifier value.
    pub fn register(&mut self, identifier: &str, data: Vec<u8>) {
        debug!(identifier, bytes = data.len(), "registered signature policy");
        self.files.insert(identifier.to_owned(), data);
    }
}

impl PolicyDocumentProvider for InMemoryPolicyProvider {
    fn policy_document_stream(&self, id: &ObjectIdentifier) -> Option<Box<dyn Read + '_>> {
        debug!(kind = ?id.kind(), identifier = id.identifier(), "retrieving signature policy");
        match self.files.get(id.identifier()) {
            Some(data) => Some(Box::new(Cursor::new(data.as_slice()))),
            None => {
                warn!(
                    identifier = id.identifier(),
                    "request for unregistered signature policy"
                );
                None
            }
        }
    }
}

/// Supplies a digest engine for a digest algorithm URI.
pub trait DigestEngineProvider {
    /// Fails with [`Error::UnsupportedAlgorithm`] when the algorithm is
    /// not available.
    fn engine(&self, algorithm_uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error>;
}

/// The standard provider, backed by the digest engines in
/// [`sigtuna_crypto`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDigestProvider;

impl DigestEngineProvider for StandardDigestProvider {
    fn engine(&self, algorithm_uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
        sigtuna_crypto::digest::from_uri(algorithm_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_policy_is_streamed_back() {
        let mut provider = InMemoryPolicyProvider::new();
        provider.register("http://example.org/policy", b"bytes".to_vec());

        let id = ObjectIdentifier::uri("http://example.org/policy");
        let mut stream = provider.policy_document_stream(&id).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"bytes");
    }

    #[test]
    fn unknown_policy_is_absent() {
        let provider = InMemoryPolicyProvider::new();
        let id = ObjectIdentifier::uri("urn:example:unknown");
        assert!(provider.policy_document_stream(&id).is_none());
    }

    #[test]
    fn standard_provider_rejects_unknown_algorithms() {
        let err = StandardDigestProvider
            .engine("http://example.org/not-a-digest")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
