#![forbid(unsafe_code)]

//! Owned XML document wrapper over roxmltree.

use sigtuna_core::Error;

/// An owned XML document. Stores the text; the parsed tree borrows from it.
///
/// `roxmltree` documents borrow from their input, so the tree cannot be
/// stored alongside the text. Call [`XmlDocument::parse_doc`] to obtain a
/// temporary `roxmltree::Document` whenever tree access is needed.
pub struct XmlDocument {
    text: String,
}

impl XmlDocument {
    /// Parse and validate XML from a string, taking ownership.
    ///
    /// Parsing uses roxmltree's default options: DTDs are rejected and no
    /// external entities are processed. Policy documents are untrusted
    /// input.
    pub fn parse(text: String) -> Result<Self, Error> {
        let _doc =
            roxmltree::Document::parse(&text).map_err(|e| Error::XmlParse(e.to_string()))?;
        Ok(Self { text })
    }

    /// Parse and validate XML from bytes.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::XmlParse(format!("invalid UTF-8: {e}")))?
            .to_owned();
        Self::parse(text)
    }

    /// Get the raw XML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse the document and return a temporary `roxmltree::Document`.
    pub fn parse_doc(&self) -> Result<roxmltree::Document<'_>, Error> {
        roxmltree::Document::parse(&self.text).map_err(|e| Error::XmlParse(e.to_string()))
    }
}
