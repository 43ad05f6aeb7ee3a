/// Errors that can occur while reading or writing identification cache files
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TSV reading or writing error
    #[error("TSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A row had fewer fields than the file format requires
    #[error("Row {line} has {found} fields, expected at least {expected}")]
    ShortRow {
        /// 1-based line number
        line: u64,
        /// Fields present
        found: usize,
        /// Fields required
        expected: usize,
    },

    /// A numeric field could not be parsed
    #[error("Invalid value '{value}' for field '{field}' on line {line}")]
    InvalidField {
        /// 1-based line number
        line: u64,
        /// Column name
        field: &'static str,
        /// Raw value
        value: String,
    },

    /// The temporary file could not be moved into place
    #[error("Failed to persist checkpoint: {0}")]
    PersistError(#[from] tempfile::PersistError),
}
