#![forbid(unsafe_code)]

//! In-memory URI resolution for XML processing.
//!
//! An embedding XML engine asks each registered resolver whether it
//! claims a URI reference (`can_resolve`) and, if so, for the content
//! (`resolve`). This resolver serves pre-registered byte content without
//! touching the filesystem or network. Pure fragment references and
//! HTTP(S) URIs are outside its domain; the engine routes those to other
//! resolution mechanisms.
//!
//! Registration is a single-writer phase: all `register` calls must
//! happen before resolution begins. The shared-reference methods are
//! then safe for concurrent use.

use std::collections::HashMap;
use tracing::debug;
use url::Url;
use sigtuna_core::Error;

/// A URI → byte-content table queried during XML processing.
#[derive(Debug, Default)]
pub struct InMemoryResourceResolver {
    files: HashMap<String, Vec<u8>>,
}

impl InMemoryResourceResolver {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Register content under a URI, overwriting any previous entry.
    ///
    /// The key is normalized the same way `resolve` normalizes lookups,
    /// so a registered URI is always found by its own reference.
    pub fn register(&mut self, uri: &str, data: Vec<u8>) -> Result<(), Error> {
        let key = normalize_uri(uri, None)?;
        debug!(uri = key.as_str(), bytes = data.len(), "registered resource");
        self.files.insert(key, data);
        Ok(())
    }

    /// Whether this resolver claims the given reference.
    ///
    /// Returns `false` for an absent or empty candidate, a pure fragment
    /// reference (`#...`, a local document reference), and HTTP(S) URIs.
    pub fn can_resolve(&self, candidate: Option<&str>) -> bool {
        match candidate {
            None | Some("") => false,
            Some(uri) => {
                if uri.starts_with('#') || uri.starts_with("http://") || uri.starts_with("https://")
                {
                    return false;
                }
                debug!(uri, "resolver claims URI");
                true
            }
        }
    }

    /// Resolve a reference, optionally against a base URI, and return the
    /// registered content.
    ///
    /// A missing entry is an error, never silently empty content.
    pub fn resolve(&self, candidate: &str, base: Option<&str>) -> Result<&[u8], Error> {
        let resolved = normalize_uri(candidate, base)?;
        debug!(uri = resolved.as_str(), "resolving resource");
        self.files
            .get(&resolved)
            .map(Vec::as_slice)
            .ok_or(Error::ResourceNotFound(resolved))
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Resolve `candidate` against `base` per RFC 3986 when a base is given,
/// then strip any fragment: fragments identify sub-parts of a fetched
/// resource, not distinct resources. A standalone relative reference is
/// used verbatim (minus its fragment).
fn normalize_uri(candidate: &str, base: Option<&str>) -> Result<String, Error> {
    match base.filter(|b| !b.is_empty()) {
        Some(base) => {
            let base = Url::parse(base)
                .map_err(|e| Error::InvalidUri(format!("base {base}: {e}")))?;
            let mut resolved = base
                .join(candidate)
                .map_err(|e| Error::InvalidUri(format!("{candidate}: {e}")))?;
            resolved.set_fragment(None);
            Ok(resolved.into())
        }
        None => match Url::parse(candidate) {
            Ok(mut absolute) => {
                absolute.set_fragment(None);
                Ok(absolute.into())
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let stripped = candidate.split('#').next().unwrap_or("");
                Ok(stripped.to_owned())
            }
            Err(e) => Err(Error::InvalidUri(format!("{candidate}: {e}"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_resolve_truth_table() {
        let resolver = InMemoryResourceResolver::new();
        assert!(!resolver.can_resolve(None));
        assert!(!resolver.can_resolve(Some("")));
        assert!(!resolver.can_resolve(Some("#section1")));
        assert!(!resolver.can_resolve(Some("http://example.org/x")));
        assert!(!resolver.can_resolve(Some("https://example.org/x")));
        assert!(resolver.can_resolve(Some("policy/doc.xml")));
        assert!(resolver.can_resolve(Some("urn:oid:1.2.840.10040")));
        assert!(resolver.can_resolve(Some("file:///policies/doc.xml")));
    }

    #[test]
    fn unregistered_uri_is_not_found() {
        let resolver = InMemoryResourceResolver::new();
        let err = resolver.resolve("policy/doc.xml", None).unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
    }

    #[test]
    fn register_then_resolve_round_trips() {
        let mut resolver = InMemoryResourceResolver::new();
        resolver.register("policy/doc.xml", b"content".to_vec()).unwrap();
        assert_eq!(resolver.resolve("policy/doc.xml", None).unwrap(), b"content");
    }

    #[test]
    fn register_overwrites() {
        let mut resolver = InMemoryResourceResolver::new();
        resolver.register("a", b"one".to_vec()).unwrap();
        resolver.register("a", b"two".to_vec()).unwrap();
        assert_eq!(resolver.resolve("a", None).unwrap(), b"two");
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn fragment_is_stripped_before_lookup() {
        let mut resolver = InMemoryResourceResolver::new();
        resolver
            .register("file:///policies/doc.xml", b"data".to_vec())
            .unwrap();
        assert_eq!(
            resolver
                .resolve("file:///policies/doc.xml#part", None)
                .unwrap(),
            b"data"
        );
        assert_eq!(
            resolver.resolve("policies/sub.xml#x", None).unwrap_err().to_string(),
            Error::ResourceNotFound("policies/sub.xml".into()).to_string()
        );
    }

    #[test]
    fn relative_reference_resolves_against_base() {
        let mut resolver = InMemoryResourceResolver::new();
        resolver
            .register("file:///policies/doc.xml", b"data".to_vec())
            .unwrap();
        assert_eq!(
            resolver
                .resolve("doc.xml", Some("file:///policies/base.xml"))
                .unwrap(),
            b"data"
        );
        assert_eq!(
            resolver
                .resolve("../policies/doc.xml#frag", Some("file:///other/base.xml"))
                .unwrap(),
            b"data"
        );
    }

    #[test]
    fn invalid_base_is_an_error() {
        let resolver = InMemoryResourceResolver::new();
        let err = resolver.resolve("doc.xml", Some("::not a uri::")).unwrap_err();
        assert!(matches!(err, Error::InvalidUri(_)));
    }
}
