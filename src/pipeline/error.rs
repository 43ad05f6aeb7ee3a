use std::path::PathBuf;

use crate::auth::AuthError;
use crate::cache::CacheError;
use crate::coalesce::CoalesceError;
use crate::output::OutputError;
use crate::parser::ParseError;
use crate::registry::RegistryError;
use crate::speclib::LibraryError;

/// Errors that abort a build
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The credential check failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// A document could not be parsed
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// Offending document
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ParseError,
    },

    /// A cache file could not be read or written
    #[error("Cache file {}: {source}", path.display())]
    Cache {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: CacheError,
    },

    /// The spectral library could not be read
    #[error("Spectral library {}: {source}", path.display())]
    Library {
        /// Library file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: LibraryError,
    },

    /// A file the configuration marks as required does not exist
    #[error("Required file not found: {}", .0.display())]
    MissingRequiredFile(PathBuf),

    /// A line of the experiment list could not be interpreted
    #[error("Experiment list {}, line {line}: {detail}", path.display())]
    ExperimentList {
        /// Experiment list file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What was wrong
        detail: String,
    },

    /// A decoy-correction file held no usable value
    #[error("Decoy correction file {} holds no numeric value", .0.display())]
    InvalidDecoyCorrection(PathBuf),

    /// Accession assignment failed
    #[error("Accession registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Coalescing failed
    #[error("Coalescing failed: {0}")]
    Coalesce(#[from] CoalesceError),

    /// Writing the outputs failed
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Other I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run summary could not be serialized
    #[error("Run summary serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
