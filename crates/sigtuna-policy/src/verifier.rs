#![forbid(unsafe_code)]

//! End-to-end signature policy verification.
//!
//! Flow: retrieve policy bytes from the document provider, load them
//! (structured or opaque), apply the declared transforms, serialize,
//! digest with the algorithm named by the signature, and compare against
//! the expected digest value. Each stage has its own typed failure; an
//! implied policy short-circuits to a success outcome with nothing to
//! verify.

use crate::data::{PolicyVerificationOutcome, SignaturePolicy, SignaturePolicyData, VerifiedPolicy};
use crate::error::PolicyVerificationError;
use crate::loader::PolicyDocument;
use crate::provider::{DigestEngineProvider, PolicyDocumentProvider};
use crate::transform;
use base64::Engine;
use sigtuna_core::Error;
use std::io::Read;
use tracing::{debug, warn};

/// Verifies signature policy references against a document provider and
/// a digest engine provider.
pub struct PolicyVerifier<'a> {
    documents: &'a dyn PolicyDocumentProvider,
    digests: &'a dyn DigestEngineProvider,
}

impl<'a> PolicyVerifier<'a> {
    pub fn new(
        documents: &'a dyn PolicyDocumentProvider,
        digests: &'a dyn DigestEngineProvider,
    ) -> Self {
        Self { documents, digests }
    }

    /// Verify a signature's policy reference.
    pub fn verify(
        &self,
        policy: &SignaturePolicy,
    ) -> Result<PolicyVerificationOutcome, PolicyVerificationError> {
        let data = match policy {
            SignaturePolicy::Implied => return Ok(PolicyVerificationOutcome::Implied),
            SignaturePolicy::Identified(data) => data,
        };

        let raw = self.retrieve(data)?;
        let identifier = &data.identifier;

        let document = PolicyDocument::parse(raw);
        let document = transform::apply_transforms(document, &data.transforms).map_err(|e| {
            PolicyVerificationError::TransformFailure {
                identifier: identifier.clone(),
                source: e,
            }
        })?;
        let bytes = document
            .to_bytes()
            .map_err(|e| PolicyVerificationError::TransformFailure {
                identifier: identifier.clone(),
                source: e,
            })?;

        let mut engine = self.digests.engine(&data.digest.algorithm).map_err(|e| {
            PolicyVerificationError::CannotDigest {
                identifier: identifier.clone(),
                source: e,
            }
        })?;
        engine.update(&bytes);
        let computed = engine.finalize();

        let b64 = base64::engine::general_purpose::STANDARD;
        debug!(
            identifier = identifier.identifier(),
            algorithm = data.digest.algorithm.as_str(),
            computed = b64.encode(&computed),
            expected = b64.encode(&data.digest.value),
            "comparing policy document digests"
        );
        if computed != data.digest.value {
            warn!(
                identifier = identifier.identifier(),
                "policy document digest does not match"
            );
            return Err(PolicyVerificationError::DigestMismatch {
                identifier: identifier.clone(),
            });
        }

        Ok(PolicyVerificationOutcome::Verified(VerifiedPolicy {
            identifier: identifier.clone(),
            location_url: data.location_url.clone(),
        }))
    }

    /// Fetch the policy bytes. The provider's stream is fully consumed
    /// and dropped here, on success and failure alike.
    fn retrieve(&self, data: &SignaturePolicyData) -> Result<Vec<u8>, PolicyVerificationError> {
        let identifier = &data.identifier;
        let mut stream = self
            .documents
            .policy_document_stream(identifier)
            .ok_or_else(|| {
                warn!(
                    identifier = identifier.identifier(),
                    "no policy document found for identifier"
                );
                PolicyVerificationError::PolicyUnavailable {
                    identifier: identifier.clone(),
                    source: None,
                }
            })?;

        let mut raw = Vec::new();
        match stream.read_to_end(&mut raw) {
            Ok(_) => Ok(raw),
            Err(e) => Err(PolicyVerificationError::PolicyUnavailable {
                identifier: identifier.clone(),
                source: Some(Error::Io(e)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DigestSpec;
    use crate::identifier::ObjectIdentifier;
    use crate::provider::{InMemoryPolicyProvider, StandardDigestProvider};
    use crate::transform::{TransformAlgorithm, XPath2Filter};
    use sha2::{Digest, Sha256};
    use sigtuna_core::algorithm;

    const POLICY_ID: &str = "http://example.org/policies/sp-1";

    fn sha256(data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn provider_with(raw: &[u8]) -> InMemoryPolicyProvider {
        let mut provider = InMemoryPolicyProvider::new();
        provider.register(POLICY_ID, raw.to_vec());
        provider
    }

    fn identified(digest: DigestSpec) -> SignaturePolicyData {
        SignaturePolicyData::new(ObjectIdentifier::uri(POLICY_ID), digest)
    }

    #[test]
    fn implied_policy_is_a_success_outcome() {
        let provider = InMemoryPolicyProvider::new();
        let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
        let outcome = verifier.verify(&SignaturePolicy::Implied).unwrap();
        assert_eq!(outcome, PolicyVerificationOutcome::Implied);
    }

    #[test]
    fn well_formed_xml_with_canonicalization_verifies() {
        // Raw bytes differ from the canonical form (attribute spacing).
        let raw = b"<Policy  version=\"1\"><Rule>hash all</Rule></Policy>";
        let canonical = b"<Policy version=\"1\"><Rule>hash all</Rule></Policy>";

        let provider = provider_with(raw);
        let policy = SignaturePolicy::Identified(
            identified(DigestSpec::new(algorithm::SHA256, sha256(canonical)))
                .with_transform(TransformAlgorithm::from_uri(algorithm::EXC_C14N))
                .with_location_url("http://example.org/policies/sp-1.xml"),
        );

        let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
        match verifier.verify(&policy).unwrap() {
            PolicyVerificationOutcome::Verified(v) => {
                assert_eq!(v.identifier.identifier(), POLICY_ID);
                assert_eq!(
                    v.location_url.as_deref(),
                    Some("http://example.org/policies/sp-1.xml")
                );
            }
            other => panic!("expected Verified, got {other:?}"),
        }
    }

    #[test]
    fn altered_expected_digest_is_a_mismatch() {
        let raw = b"<Policy  version=\"1\"><Rule>hash all</Rule></Policy>";
        let canonical = b"<Policy version=\"1\"><Rule>hash all</Rule></Policy>";
        let mut expected = sha256(canonical);
        expected[0] ^= 0x01;

        let provider = provider_with(raw);
        let policy = SignaturePolicy::Identified(
            identified(DigestSpec::new(algorithm::SHA256, expected))
                .with_transform(TransformAlgorithm::from_uri(algorithm::EXC_C14N)),
        );

        let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
        let err = verifier.verify(&policy).unwrap_err();
        assert!(matches!(
            err,
            PolicyVerificationError::DigestMismatch { .. }
        ));
        assert_eq!(err.identifier().identifier(), POLICY_ID);
    }

    #[test]
    fn missing_document_is_unavailable() {
        let provider = InMemoryPolicyProvider::new();
        let policy = SignaturePolicy::Identified(identified(DigestSpec::new(
            algorithm::SHA256,
            vec![0; 32],
        )));

        let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
        let err = verifier.verify(&policy).unwrap_err();
        assert!(matches!(
            err,
            PolicyVerificationError::PolicyUnavailable { source: None, .. }
        ));
    }

    #[test]
    fn opaque_policy_is_digested_over_raw_bytes() {
        // Non-XML policy text with a non-empty transform list: the
        // transforms do not apply, the raw bytes are hashed directly.
        let raw = b"Signature Policy v1: all signatures must be timestamped.";

        let provider = provider_with(raw);
        let policy = SignaturePolicy::Identified(
            identified(DigestSpec::new(algorithm::SHA256, sha256(raw)))
                .with_transform(TransformAlgorithm::from_uri(algorithm::EXC_C14N)),
        );

        let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
        let outcome = verifier.verify(&policy).unwrap();
        assert!(matches!(outcome, PolicyVerificationOutcome::Verified(_)));
    }

    #[test]
    fn subtract_filter_removes_element_before_digesting() {
        let raw = b"<Policy><Secret>internal</Secret><Rule>keep</Rule></Policy>";
        // The same document with the Secret element removed by hand,
        // in canonical form.
        let pruned = b"<Policy><Rule>keep</Rule></Policy>";

        let transforms = vec![
            TransformAlgorithm::XPathFilter2(vec![XPath2Filter::subtract("//Secret")]),
            TransformAlgorithm::from_uri(algorithm::EXC_C14N),
        ];

        // The canonical bytes must not contain the filtered element.
        let document = PolicyDocument::parse(raw.to_vec());
        let document = transform::apply_transforms(document, &transforms).unwrap();
        let bytes = document.to_bytes().unwrap();
        assert!(!String::from_utf8(bytes.clone()).unwrap().contains("Secret"));
        assert_eq!(bytes, pruned);

        let provider = provider_with(raw);
        let mut data = identified(DigestSpec::new(algorithm::SHA256, sha256(pruned)));
        data.transforms = transforms;
        let policy = SignaturePolicy::Identified(data);

        let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
        let outcome = verifier.verify(&policy).unwrap();
        assert!(matches!(outcome, PolicyVerificationOutcome::Verified(_)));
    }

    #[test]
    fn unsupported_digest_algorithm_cannot_digest() {
        let provider = provider_with(b"<Policy/>");
        let policy = SignaturePolicy::Identified(identified(DigestSpec::new(
            "http://example.org/no-such-digest",
            vec![0; 32],
        )));

        let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
        let err = verifier.verify(&policy).unwrap_err();
        assert!(matches!(err, PolicyVerificationError::CannotDigest { .. }));
    }

    #[test]
    fn repeated_verification_is_deterministic() {
        let raw = b"<Policy><Rule>r</Rule></Policy>";
        let provider = provider_with(raw);
        let policy = SignaturePolicy::Identified(
            identified(DigestSpec::new(algorithm::SHA256, sha256(raw)))
                .with_transform(TransformAlgorithm::from_uri(algorithm::C14N_PHYSICAL)),
        );

        let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
        for _ in 0..3 {
            assert!(verifier.verify(&policy).is_ok());
        }
    }
}
