use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PipelineError;
use crate::merge::MergeStats;

/// Counters and timestamps of one build, written as `<prefix>.summary.json`
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    /// Experiments in the build
    pub experiments: usize,
    /// Checkpoints reused instead of re-parsing
    pub checkpoints_reused: usize,
    /// Identification documents parsed
    pub documents_parsed: usize,
    /// Spectra seen in parsed documents
    pub spectra: usize,
    /// Spectra without a search result
    pub unmatched_spectra: usize,
    /// Records in checkpoints (parsed or reused), sentinels included
    pub checkpoint_records: usize,
    /// Keys in the initial-probability index (0 when not in use)
    pub index_keys: usize,
    /// Grouping documents parsed
    pub grouping_documents: usize,
    /// Protein-inference entries loaded
    pub grouping_entries: usize,
    /// Experiments merged without any grouping document
    pub missing_grouping_documents: usize,
    /// Experiments whose decoy correction was applied
    pub decoy_corrections: usize,
    /// Protein-adjustment counters summed over experiments
    pub merge: MergeStats,
    /// Records in the sorted list
    pub sorted_records: usize,
    /// Peptide summaries written
    pub peptides: usize,
    /// Accessions assigned while coalescing
    pub accessions_assigned: usize,
    /// Summaries without biosequence attributes
    pub unresolved_biosequences: usize,
    /// Soft failures logged during the run
    pub warnings: usize,
    /// Start of the run
    pub started_at: Option<DateTime<Utc>>,
    /// End of the run
    pub finished_at: Option<DateTime<Utc>>,
}

impl BuildStats {
    /// Write the statistics as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Built {} peptides from {} experiments ({} records kept of {}, {} warnings)",
            self.peptides,
            self.experiments,
            self.merge.retained,
            self.merge.records,
            self.warnings
        )
    }
}
