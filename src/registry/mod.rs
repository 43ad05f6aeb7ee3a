//! # Registries
//!
//! Injected lookups the build consults while it runs:
//!
//! - peptide accessions ([`AccessionSource`]), assigned on first sight of a
//!   sequence and persisted so that every later run returns the same value;
//! - biosequence attributes ([`BiosequenceRegistry`]), a read-only gene name /
//!   description lookup for the protein reported against each peptide.
//!
//! Both registries carry an explicit `loaded` flag rather than treating an
//! empty map as "not loaded yet".

mod accession;
mod biosequence;
mod error;


pub use accession::{AccessionFormat, FileAccessionRegistry, MemoryAccessionRegistry};
pub use biosequence::{BiosequenceAttributes, BiosequenceRegistry};
pub use error::RegistryError;

/// Source of stable peptide accessions
pub trait AccessionSource {
    /// Accession for `sequence`, allocating and persisting a new one when the
    /// sequence has never been seen.
    fn accession_for(&mut self, sequence: &str) -> Result<String, RegistryError>;
}
