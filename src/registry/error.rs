/// Errors that can occur while reading or extending a registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// I/O error on the backing store
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TSV parsing error
    #[error("TSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// A stored row could not be interpreted
    #[error("Malformed registry row {line} in {path}: {detail}")]
    MalformedRow {
        /// Registry file
        path: String,
        /// 1-based line number
        line: u64,
        /// What was wrong with the row
        detail: String,
    },

    /// Allocation produced an identifier that is not a positive integer
    #[error("Accession allocation for '{sequence}' did not yield a positive identifier")]
    NonPositiveIdentifier {
        /// Peptide sequence that was being registered
        sequence: String,
    },

    /// Required column missing from a biosequence file
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}
