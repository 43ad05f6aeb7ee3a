use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ExperimentId, IdentificationRecord};

/// Aggregate of one (modified_sequence, charge) form of a peptide
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifiedInstance {
    /// Records contributing to this form
    pub n_instances: u32,
    /// Highest spectrum probability
    pub best_probability: f64,
    /// Highest adjusted probability over the first record of each experiment
    pub best_adjusted_probability: Option<f64>,
    /// Adjusted observations, counted once per experiment
    pub n_adjusted_observations: u32,
    /// Sibling peptides, counted once per experiment
    pub n_sibling_peptides: f64,
    /// Experiments that observed this form
    pub experiments: BTreeSet<ExperimentId>,
}

/// Best-evidence summary of one distinct peptide sequence
#[derive(Debug, Clone, PartialEq)]
pub struct PeptideSummary {
    /// Stripped peptide sequence
    pub peptide_sequence: String,
    /// Peptide accession (first non-empty value seen)
    pub peptide_accession: Option<String>,
    /// Preceding residue of the first record
    pub preceding_residue: String,
    /// Following residue of the first record
    pub following_residue: String,
    /// Protein of the first record
    pub protein_name: String,
    /// Highest spectrum probability
    pub best_probability: f64,
    /// Highest adjusted probability over the first-seen record of each
    /// (form, experiment)
    pub best_adjusted_probability: Option<f64>,
    /// Records contributing to this peptide
    pub n_instances: u32,
    /// Adjusted observations summed once per (form, experiment)
    pub n_adjusted_observations: u32,
    /// Sibling peptides summed once per (form, experiment)
    pub n_sibling_peptides: f64,
    /// Experiments that observed the peptide
    pub experiments: BTreeSet<ExperimentId>,
    /// modified_sequence -> charge -> form aggregate
    pub modified_instances: BTreeMap<String, BTreeMap<Option<u8>, ModifiedInstance>>,
}

impl PeptideSummary {
    /// Start a summary from the first record of a group
    pub fn new(first: &IdentificationRecord) -> Self {
        let mut summary = Self {
            peptide_sequence: first.stripped_sequence.clone(),
            peptide_accession: None,
            preceding_residue: first.preceding_residue.clone(),
            following_residue: first.following_residue.clone(),
            protein_name: first.protein_name.clone(),
            best_probability: 0.0,
            best_adjusted_probability: None,
            n_instances: 0,
            n_adjusted_observations: 0,
            n_sibling_peptides: 0.0,
            experiments: BTreeSet::new(),
            modified_instances: BTreeMap::new(),
        };
        summary.add(first);
        summary
    }

    /// Fold one more record of the same peptide into the summary
    pub fn add(&mut self, record: &IdentificationRecord) {
        let probability = record.probability.unwrap_or(0.0);

        self.n_instances += 1;
        self.best_probability = self.best_probability.max(probability);
        self.experiments.insert(record.experiment_id);
        if self.peptide_accession.is_none() {
            self.peptide_accession = record.peptide_accession.clone();
        }

        let form = self
            .modified_instances
            .entry(record.modified_sequence.clone())
            .or_default()
            .entry(record.charge)
            .or_default();
        form.n_instances += 1;
        form.best_probability = form.best_probability.max(probability);

        // Several spectra of one experiment supporting the same form carry the
        // same protein-level numbers; only the first one counts.
        if !form.experiments.insert(record.experiment_id) {
            return;
        }
        let adjustment = record.adjustment.clone().unwrap_or_default();
        let observations = adjustment.n_adjusted_observations.unwrap_or(0);
        let siblings = adjustment.n_sibling_peptides.unwrap_or(0.0);

        form.n_adjusted_observations += observations;
        form.n_sibling_peptides += siblings;
        self.n_adjusted_observations += observations;
        self.n_sibling_peptides += siblings;

        if let Some(adjusted) = adjustment.adjusted_probability {
            form.best_adjusted_probability = max_option(form.best_adjusted_probability, adjusted);
            self.best_adjusted_probability = max_option(self.best_adjusted_probability, adjusted);
        }
    }

    /// Number of experiments that observed the peptide
    pub fn n_experiments(&self) -> usize {
        self.experiments.len()
    }

    /// Comma-joined ascending experiment identifiers
    pub fn experiment_list(&self) -> String {
        join_ids(&self.experiments)
    }

    /// Iterate over `(modified_sequence, charge, form)` in sorted order
    pub fn forms(&self) -> impl Iterator<Item = (&str, Option<u8>, &ModifiedInstance)> {
        self.modified_instances.iter().flat_map(|(sequence, charges)| {
            charges
                .iter()
                .map(move |(charge, form)| (sequence.as_str(), *charge, form))
        })
    }
}

/// Comma-joined ascending identifiers
pub fn join_ids(ids: &BTreeSet<ExperimentId>) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn max_option(current: Option<f64>, candidate: f64) -> Option<f64> {
    match current {
        Some(best) if best >= candidate => Some(best),
        _ => Some(candidate),
    }
}
