/// Errors that can occur while coalescing records
#[derive(Debug, thiserror::Error)]
pub enum CoalesceError {
    /// A record's peptide sequence sorts before the group that preceded it
    #[error("Input is not sorted by peptide sequence: '{found}' arrived after '{previous}'")]
    UnsortedInput {
        /// Sequence of the group already flushed or in progress
        previous: String,
        /// Sequence of the offending record
        found: String,
    },
}
