#![forbid(unsafe_code)]

//! Policy object identifiers.

use std::fmt;

/// How a policy identifier value is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// A plain URI.
    Uri,
    /// An OID written as a URI.
    OidAsUri,
    /// An OID written as a URN (`urn:oid:...`).
    OidAsUrn,
}

/// An identifier for a signature policy, used as the correlation key in
/// every error and log event. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentifier {
    identifier: String,
    kind: IdentifierKind,
    description: Option<String>,
}

impl ObjectIdentifier {
    /// Create an identifier of the given kind.
    pub fn new(identifier: impl Into<String>, kind: IdentifierKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            description: None,
        }
    }

    /// Create a plain-URI identifier.
    pub fn uri(identifier: impl Into<String>) -> Self {
        Self::new(identifier, IdentifierKind::Uri)
    }

    /// Create an OID-as-URN identifier.
    pub fn oid_as_urn(identifier: impl Into<String>) -> Self {
        Self::new(identifier, IdentifierKind::OidAsUrn)
    }

    /// Attach a human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The identifier value.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The identifier kind.
    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// The optional description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_identifier_value() {
        let id = ObjectIdentifier::uri("http://example.org/policy").with_description("test");
        assert_eq!(id.to_string(), "http://example.org/policy");
        assert_eq!(id.description(), Some("test"));
        assert_eq!(id.kind(), IdentifierKind::Uri);
    }
}
