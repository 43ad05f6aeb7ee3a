use super::{Attributes, ElementHandler, ParseError};
use crate::model::{peptide_key, ExperimentId, ProteinInferenceEntry, ProteinInferenceMap};

/// Grouping-document peptides are kept when their initial probability is at
/// least `threshold - GROUPING_RETENTION_MARGIN`.
///
/// Over-retains borderline peptides, since protein-level adjustment can lift
/// a peptide above its stand-alone initial value.
pub const GROUPING_RETENTION_MARGIN: f64 = 0.2;

/// Settings for decoding one grouping document
#[derive(Debug, Clone)]
pub struct GroupingOptions {
    /// Experiment the document belongs to (`None` for a shared master document)
    pub experiment_id: Option<ExperimentId>,
    /// Global probability threshold of the build
    pub probability_threshold: f64,
}

impl GroupingOptions {
    /// Options for one experiment's grouping document
    pub fn new(experiment_id: Option<ExperimentId>, probability_threshold: f64) -> Self {
        Self {
            experiment_id,
            probability_threshold,
        }
    }

    /// Lowest initial probability retained
    pub fn retention_floor(&self) -> f64 {
        self.probability_threshold - GROUPING_RETENTION_MARGIN
    }
}

/// Counters collected while decoding a grouping document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// protein elements seen
    pub proteins: usize,
    /// peptide elements seen
    pub peptides: usize,
    /// Peptides below the retention floor
    pub below_floor: usize,
    /// Keys stored, twins included
    pub entries: usize,
    /// Keys skipped because an earlier element of this document already used them
    pub duplicate_keys: usize,
}

#[derive(Debug, Default)]
struct TwinScratch {
    sequence: String,
    modified_sequence: Option<String>,
}

/// Per-peptide accumulator, reset whenever a peptide element opens
#[derive(Debug, Default)]
struct PeptideScratch {
    sequence: String,
    modified_sequence: Option<String>,
    charge: Option<u8>,
    initial_probability: f64,
    nsp_adjusted_probability: Option<f64>,
    n_sibling_peptides: Option<f64>,
    n_adjusted_observations: Option<u32>,
    twins: Vec<TwinScratch>,
    current_twin: Option<TwinScratch>,
}

pub(super) struct GroupingHandler<'a> {
    options: &'a GroupingOptions,
    protein_name: String,
    peptide: Option<PeptideScratch>,
    entries: ProteinInferenceMap,
    stats: GroupingStats,
}

impl<'a> GroupingHandler<'a> {
    pub(super) fn new(options: &'a GroupingOptions) -> Self {
        Self {
            options,
            protein_name: String::new(),
            peptide: None,
            entries: ProteinInferenceMap::new(),
            stats: GroupingStats::default(),
        }
    }

    pub(super) fn into_parts(self) -> (ProteinInferenceMap, GroupingStats) {
        (self.entries, self.stats)
    }

    fn open_peptide(&mut self, attributes: &Attributes) -> Result<(), ParseError> {
        self.stats.peptides += 1;
        let sequence = attributes
            .non_empty("peptide_sequence")
            .ok_or_else(|| ParseError::MissingPeptideSequence {
                protein: self.protein_name.clone(),
            })?
            .to_string();

        // Reported as a decimal (e.g. "2.00") by some grouping tools
        let n_adjusted_observations = match attributes.parse::<f64>("peptide", "exp_tot_instances")? {
            Some(n) => Some(n),
            None => attributes.parse::<f64>("peptide", "n_instances")?,
        }
        .map(|n| n.max(0.0).round() as u32);

        self.peptide = Some(PeptideScratch {
            sequence,
            charge: attributes.parse("peptide", "charge")?,
            initial_probability: attributes
                .parse("peptide", "initial_probability")?
                .unwrap_or(0.0),
            nsp_adjusted_probability: attributes.parse("peptide", "nsp_adjusted_probability")?,
            n_sibling_peptides: attributes.parse("peptide", "n_sibling_peptides")?,
            n_adjusted_observations,
            ..Default::default()
        });
        Ok(())
    }

    fn close_peptide(&mut self, peptide: PeptideScratch) {
        if peptide.initial_probability < self.options.retention_floor() {
            self.stats.below_floor += 1;
            return;
        }

        let entry = ProteinInferenceEntry {
            experiment_id: self.options.experiment_id,
            charge: peptide.charge,
            initial_probability: peptide.initial_probability,
            nsp_adjusted_probability: peptide.nsp_adjusted_probability,
            n_sibling_peptides: peptide.n_sibling_peptides,
            n_adjusted_observations: peptide.n_adjusted_observations,
            protein_name: self.protein_name.clone(),
        };

        let modified = peptide
            .modified_sequence
            .as_deref()
            .unwrap_or(&peptide.sequence);
        let key = peptide_key(peptide.charge, modified, &peptide.sequence);
        self.store(key, entry.clone());

        // Twins share the numeric payload under their own sequence
        for twin in &peptide.twins {
            let modified = twin.modified_sequence.as_deref().unwrap_or(&twin.sequence);
            let key = peptide_key(peptide.charge, modified, &twin.sequence);
            self.store(key, entry.clone());
        }
    }

    fn store(&mut self, key: String, entry: ProteinInferenceEntry) {
        if self.entries.insert_first(key, entry) {
            self.stats.entries += 1;
        } else {
            self.stats.duplicate_keys += 1;
        }
    }
}

impl ElementHandler for GroupingHandler<'_> {
    fn element_open(&mut self, name: &str, attributes: &Attributes) -> Result<(), ParseError> {
        match name {
            "protein" => {
                self.stats.proteins += 1;
                self.protein_name = attributes
                    .get("protein_name")
                    .unwrap_or_default()
                    .to_string();
            }
            "peptide" => self.open_peptide(attributes)?,
            "indistinguishable_peptide" => {
                if let Some(peptide) = self.peptide.as_mut() {
                    if let Some(sequence) = attributes.non_empty("peptide_sequence") {
                        peptide.current_twin = Some(TwinScratch {
                            sequence: sequence.to_string(),
                            modified_sequence: None,
                        });
                    }
                }
            }
            "modification_info" => {
                if let Some(peptide) = self.peptide.as_mut() {
                    let modified = attributes.non_empty("modified_peptide").map(str::to_string);
                    match peptide.current_twin.as_mut() {
                        Some(twin) => twin.modified_sequence = modified,
                        None => peptide.modified_sequence = modified,
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn element_close(&mut self, name: &str) -> Result<(), ParseError> {
        match name {
            "indistinguishable_peptide" => {
                if let Some(peptide) = self.peptide.as_mut() {
                    if let Some(twin) = peptide.current_twin.take() {
                        peptide.twins.push(twin);
                    }
                }
            }
            "peptide" => {
                if let Some(peptide) = self.peptide.take() {
                    self.close_peptide(peptide);
                }
            }
            "protein" => self.protein_name.clear(),
            _ => {}
        }
        Ok(())
    }
}
