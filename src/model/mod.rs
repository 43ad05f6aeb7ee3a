//! # Identification Data Model
//!
//! Flat records shared by every stage of the build:
//!
//! - [`IdentificationRecord`]: one peptide-spectrum match, produced by the
//!   identification parser and rewritten in place by the protein-adjustment merger.
//! - [`ProteinInferenceEntry`]: one peptide's protein-level evidence taken from a
//!   grouping document, keyed by [`peptide_key`].
//! - [`ProteinInferenceMap`]: the keyed collection of those entries for one
//!   experiment (or for every experiment when a master document is shared).
//!
//! ## Peptide keys
//!
//! Records and inference entries meet on a textual key. When the charge is known
//! the key is `charge-modified_sequence` (the "unstripped key"), otherwise the bare
//! stripped sequence is used.

use std::collections::hash_map::{self, HashMap};

mod sequence;

#[cfg(test)]
mod tests;

pub use sequence::{strip_modifications, ModificationSet};

/// Numeric identifier of one input experiment (search batch)
pub type ExperimentId = u32;

/// Probability written for a spectrum that carried no search result
pub const NO_MATCH_PROBABILITY: f64 = -1.0;

/// Build the lookup key for a peptide.
///
/// `charge-modified_sequence` when the charge is known, the stripped
/// sequence otherwise.
pub fn peptide_key(charge: Option<u8>, modified_sequence: &str, stripped_sequence: &str) -> String {
    match charge {
        Some(charge) => format!("{}-{}", charge, modified_sequence),
        None => stripped_sequence.to_string(),
    }
}

/// Protein-level values appended to a record by the merger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProteinAdjustment {
    /// Protein-level (NSP) adjusted probability
    pub adjusted_probability: Option<f64>,
    /// Number of adjusted observations reported for the peptide
    pub n_adjusted_observations: Option<u32>,
    /// Number of sibling peptides reported for the peptide
    pub n_sibling_peptides: Option<f64>,
}

/// One peptide-spectrum match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentificationRecord {
    /// Experiment (search batch) the spectrum belongs to
    pub experiment_id: ExperimentId,
    /// Spectrum identifier as written by the search engine
    pub spectrum_id: String,
    /// Peptide accession, assigned once the match clears the parse cutoff
    pub peptide_accession: Option<String>,
    /// Sequence without modification annotations
    pub stripped_sequence: String,
    /// Residue before the peptide in the protein
    pub preceding_residue: String,
    /// Sequence annotated with bracketed mass modifications
    pub modified_sequence: String,
    /// Residue after the peptide in the protein
    pub following_residue: String,
    /// Assumed precursor charge
    pub charge: Option<u8>,
    /// Spectrum-level probability (`-1` for a spectrum without a search result)
    pub probability: Option<f64>,
    /// Precursor mass difference
    pub mass_difference: Option<f64>,
    /// Protein the search engine assigned the match to
    pub protein_name: String,
    /// Present once the protein-adjustment merger has handled the record
    pub adjustment: Option<ProteinAdjustment>,
}

impl IdentificationRecord {
    /// Sentinel record for a spectrum that had no search result
    pub fn unmatched(experiment_id: ExperimentId, spectrum_id: String, charge: Option<u8>) -> Self {
        Self {
            experiment_id,
            spectrum_id,
            charge,
            probability: Some(NO_MATCH_PROBABILITY),
            ..Default::default()
        }
    }

    /// True for the no-search-result sentinel
    pub fn is_unmatched(&self) -> bool {
        self.stripped_sequence.is_empty()
            || matches!(self.probability, Some(p) if p < 0.0)
    }

    /// The `charge-modified_sequence` key, when the charge is known
    pub fn unstripped_key(&self) -> Option<String> {
        self.charge
            .map(|charge| format!("{}-{}", charge, self.modified_sequence))
    }

    /// Keys to try against a [`ProteinInferenceMap`], most specific first
    pub fn lookup_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(key) = self.unstripped_key() {
            keys.push(key);
        }
        keys.push(self.stripped_sequence.clone());
        keys
    }

    /// Key used by the spectral library (`modified_sequence/charge`)
    pub fn library_key(&self) -> String {
        match self.charge {
            Some(charge) => format!("{}/{}", self.modified_sequence, charge),
            None => self.modified_sequence.clone(),
        }
    }
}

/// One peptide's protein-level evidence from a grouping document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProteinInferenceEntry {
    /// Experiment the grouping document belongs to (`None` for a master document)
    pub experiment_id: Option<ExperimentId>,
    /// Precursor charge
    pub charge: Option<u8>,
    /// Initial (spectrum-derived) probability reported for the peptide
    pub initial_probability: f64,
    /// NSP-adjusted probability
    pub nsp_adjusted_probability: Option<f64>,
    /// Number of sibling peptides
    pub n_sibling_peptides: Option<f64>,
    /// Number of adjusted observations
    pub n_adjusted_observations: Option<u32>,
    /// Protein the peptide was grouped under
    pub protein_name: String,
}

/// Keyed protein-inference entries for one or more experiments
#[derive(Debug, Clone, Default)]
pub struct ProteinInferenceMap {
    entries: HashMap<String, ProteinInferenceEntry>,
}

impl ProteinInferenceMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entry is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an entry unless the key is already taken. Returns whether it was stored.
    pub fn insert_first(&mut self, key: String, entry: ProteinInferenceEntry) -> bool {
        match self.entries.entry(key) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    /// Insert an entry, replacing any previous value for the key
    pub fn insert(&mut self, key: String, entry: ProteinInferenceEntry) {
        self.entries.insert(key, entry);
    }

    /// Entry stored under `key`
    pub fn get(&self, key: &str) -> Option<&ProteinInferenceEntry> {
        self.entries.get(key)
    }

    /// Find the entry for a record, trying its keys in preference order.
    ///
    /// Returns the key that matched together with the entry.
    pub fn lookup(&self, record: &IdentificationRecord) -> Option<(String, &ProteinInferenceEntry)> {
        record
            .lookup_keys()
            .into_iter()
            .find_map(|key| self.entries.get(&key).map(|entry| (key, entry)))
    }

    /// Merge another document's entries; later documents overwrite earlier ones
    pub fn absorb(&mut self, other: ProteinInferenceMap) {
        self.entries.extend(other.entries);
    }

    /// Iterate over all `(key, entry)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ProteinInferenceEntry)> {
        self.entries.iter()
    }
}
