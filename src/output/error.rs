/// Errors that can occur while writing build outputs
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TSV writing error
    #[error("TSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A close tag did not match the innermost open element.
    ///
    /// This is a defect in the caller, not a property of the input data.
    #[error("Cannot close </{found}>: innermost open element is {}", describe_open(.expected))]
    TagMismatch {
        /// Innermost open element, if any
        expected: Option<String>,
        /// Element the caller tried to close
        found: String,
    },

    /// The document was finished with elements still open
    #[error("Build document finished with unclosed elements: {0}")]
    UnclosedElements(String),
}

fn describe_open(expected: &Option<String>) -> String {
    match expected {
        Some(name) => format!("<{}>", name),
        None => "none".to_string(),
    }
}
