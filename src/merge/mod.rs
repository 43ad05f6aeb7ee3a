//! # Protein-Adjustment Merger
//!
//! Second pass of a build. Each identification record of one experiment is
//! matched against the protein-inference entries that apply to it, picks up
//! the protein-level adjustment fields and has its probability rescaled by
//! the adjustment factor
//!
//! ```text
//! factor = nsp_adjusted_probability / initial_probability
//! ```
//!
//! where `initial_probability` is the index's best value for the peptide
//! minus [`PERFECT_PROBABILITY_DEFLATION`], or the entry's own value when no
//! index is in use.
//!
//! ## Order of operations per record
//!
//! 1. sentinel records (no search result) are dropped
//! 2. lookup by `charge-modified_sequence`, then by stripped sequence
//! 3. `p = min(1, p * factor)`
//! 4. master mode: library filter, absent records end at exactly 0.5
//! 5. decoy correction `p = min(1, p * c)`, skipped for demoted records
//! 6. final gate: `p >= probability_threshold`
//!
//! A record without an entry, or whose factor cannot be computed, keeps its
//! probability and is counted; missing protein support is common and never
//! aborts a build.

use log::{debug, warn};
use serde::Serialize;

use crate::index::InitialProbabilityIndex;
use crate::model::{IdentificationRecord, ProteinAdjustment, ProteinInferenceMap};
use crate::speclib::SpectralLibrary;

#[cfg(test)]
mod tests;

/// Subtracted from the index's best probability before it is used as the
/// initial probability, matching the deflation applied upstream to perfect
/// initial probabilities.
pub const PERFECT_PROBABILITY_DEFLATION: f64 = 0.001;

/// Probability given to a record absent from the spectral library
pub const LIBRARY_ABSENT_PROBABILITY: f64 = 0.5;

/// How the protein-inference entries relate to the experiment being merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InferenceScope {
    /// One grouping document per experiment
    #[default]
    PerExperiment,
    /// One grouping document shared by every experiment; the spectral
    /// library filter applies
    Master,
}

/// Inputs that shape the merge of one experiment
#[derive(Debug, Clone, Default)]
pub struct MergeOptions<'a> {
    /// Final gate applied after every correction
    pub probability_threshold: f64,
    /// Per-experiment or master grouping document
    pub scope: InferenceScope,
    /// Best spectrum-level probabilities from the first pass
    pub index: Option<&'a InitialProbabilityIndex>,
    /// Spectral library used to demote peptides it does not contain (master mode)
    pub library: Option<&'a SpectralLibrary>,
    /// Decoy correction scalar for this experiment
    pub decoy_correction: Option<f64>,
}

/// Counters collected while merging one experiment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Records in
    pub records: usize,
    /// Sentinel records dropped
    pub unmatched: usize,
    /// Records with no protein-inference entry
    pub unassigned: usize,
    /// Records whose adjustment factor could not be computed
    pub unadjusted: usize,
    /// Records forced down because the library lacks them
    pub library_demoted: usize,
    /// Records the decoy correction was applied to
    pub decoy_corrected: usize,
    /// Records dropped by the final gate
    pub below_threshold: usize,
    /// Records kept
    pub retained: usize,
}

impl MergeStats {
    /// Records that kept their original probability for lack of protein data
    pub fn warnings(&self) -> usize {
        self.unassigned + self.unadjusted
    }

    /// Add another experiment's counters
    pub fn accumulate(&mut self, other: &MergeStats) {
        self.records += other.records;
        self.unmatched += other.unmatched;
        self.unassigned += other.unassigned;
        self.unadjusted += other.unadjusted;
        self.library_demoted += other.library_demoted;
        self.decoy_corrected += other.decoy_corrected;
        self.below_threshold += other.below_threshold;
        self.retained += other.retained;
    }
}

/// Records that passed the final gate, with the counters of the merge
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Corrected records in input order
    pub records: Vec<IdentificationRecord>,
    /// Counters
    pub stats: MergeStats,
}

/// Applies protein-level adjustment to identification records
pub struct ProteinAdjustmentMerger<'a> {
    inference: &'a ProteinInferenceMap,
    options: MergeOptions<'a>,
}

impl<'a> ProteinAdjustmentMerger<'a> {
    /// Create a merger over one set of protein-inference entries
    pub fn new(inference: &'a ProteinInferenceMap, options: MergeOptions<'a>) -> Self {
        Self { inference, options }
    }

    /// Merge one experiment's records
    pub fn merge(&self, records: Vec<IdentificationRecord>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for mut record in records {
            outcome.stats.records += 1;
            if record.is_unmatched() {
                outcome.stats.unmatched += 1;
                continue;
            }

            self.adjust(&mut record, &mut outcome.stats);

            match record.probability {
                Some(p) if p >= self.options.probability_threshold => {
                    outcome.stats.retained += 1;
                    outcome.records.push(record);
                }
                _ => outcome.stats.below_threshold += 1,
            }
        }

        if outcome.stats.warnings() > 0 {
            warn!(
                "{} of {} records kept their original probability ({} without protein entry, {} without adjustment factor)",
                outcome.stats.warnings(),
                outcome.stats.records,
                outcome.stats.unassigned,
                outcome.stats.unadjusted
            );
        }
        outcome
    }

    /// Attach adjustment fields and rewrite the probability of one record
    pub fn adjust(&self, record: &mut IdentificationRecord, stats: &mut MergeStats) {
        let factor = match self.inference.lookup(record) {
            Some((key, entry)) => {
                record.adjustment = Some(ProteinAdjustment {
                    adjusted_probability: entry.nsp_adjusted_probability,
                    n_adjusted_observations: entry.n_adjusted_observations,
                    n_sibling_peptides: entry.n_sibling_peptides,
                });

                let initial = self
                    .options
                    .index
                    .and_then(|index| index.best_for(&key))
                    .map(|best| best - PERFECT_PROBABILITY_DEFLATION)
                    .unwrap_or(entry.initial_probability);

                let factor = match entry.nsp_adjusted_probability {
                    Some(adjusted) if initial != 0.0 => Some(adjusted / initial),
                    _ => None,
                };
                if factor.is_none() {
                    stats.unadjusted += 1;
                    debug!(
                        "No adjustment factor for {} in spectrum {}",
                        key, record.spectrum_id
                    );
                }
                factor
            }
            None => {
                stats.unassigned += 1;
                record.adjustment = Some(ProteinAdjustment::default());
                debug!(
                    "No protein-inference entry for {} in spectrum {}",
                    record.modified_sequence, record.spectrum_id
                );
                None
            }
        };

        if let (Some(factor), Some(p)) = (factor, record.probability) {
            record.probability = Some((p * factor).min(1.0));
        }

        if self.options.scope == InferenceScope::Master {
            if let Some(library) = self.options.library {
                if !library.contains(&record.library_key()) {
                    stats.library_demoted += 1;
                    record.probability = Some(LIBRARY_ABSENT_PROBABILITY);
                    return;
                }
            }
        }

        if let (Some(correction), Some(p)) = (self.options.decoy_correction, record.probability) {
            stats.decoy_corrected += 1;
            record.probability = Some((p * correction).min(1.0));
        }
    }
}
