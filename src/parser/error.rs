use crate::registry::RegistryError;

/// Errors that can occur while parsing identification or grouping documents
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// I/O error while reading the document
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// UTF-8 encoding error in an element or attribute name
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// Element nesting is broken: a close without a matching open, a close
    /// that does not match the innermost open element, or a truncated document
    #[error("Malformed document structure at byte {position}: {detail}")]
    DocumentStructure {
        /// Byte offset of the offending event
        position: u64,
        /// Description naming the elements involved
        detail: String,
    },

    /// A spectrum carried more than one search result
    #[error("Spectrum '{spectrum}' has more than one search_result element")]
    MultipleSearchResults {
        /// Spectrum identifier
        spectrum: String,
    },

    /// A grouping-document peptide without a sequence
    #[error("Peptide element under protein '{protein}' has no peptide_sequence")]
    MissingPeptideSequence {
        /// Enclosing protein name (empty when outside any protein)
        protein: String,
    },

    /// An attribute value could not be converted
    #[error("Invalid value '{value}' for attribute '{attribute}' of <{element}>")]
    InvalidAttributeValue {
        /// Element carrying the attribute
        element: String,
        /// Attribute name
        attribute: String,
        /// Raw value
        value: String,
    },

    /// Peptide accession could not be assigned
    #[error("Accession registry error: {0}")]
    RegistryError(#[from] RegistryError),
}

impl ParseError {
    /// True for nesting violations
    pub fn is_structural(&self) -> bool {
        matches!(self, ParseError::DocumentStructure { .. })
    }
}
