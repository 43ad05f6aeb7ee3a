//! # Output Writers
//!
//! Emit coalesced peptide summaries as:
//!
//! - a flat tab-delimited table ([`SummaryTableWriter`], `<prefix>.tsv`)
//! - a nested build document ([`BuildDocumentWriter`], `<prefix>.PAxml`)
//! - a peptide FASTA file ([`PeptideFastaWriter`], `<prefix>.fasta`)
//!
//! Every writer is an explicit object owning its sink and is consumed by
//! `finish()`, which flushes and hands the sink back.
//!
//! ## Build document layout
//!
//! ```text
//! <build>
//!     <peptide_instance
//!             original_protein_name="sp|P02768|ALBU_HUMAN"
//!             biosequence_gene_name="ALB"
//!             peptide_accession="PAp00000001"
//!             peptide_sequence="PEPTIDEK"
//!             ...
//!             n_experiments="2"
//!             search_batch_ids="1,2">
//!         <modified_peptide_instance
//!                 peptide_string="PEPTIDEK"
//!                 charge_state="2"
//!                 ...
//!                 search_batch_ids="1,2"/>
//!     </peptide_instance>
//! </build>
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::debug;

use crate::coalesce::PeptideSummary;
use crate::model::ExperimentId;
use crate::registry::BiosequenceRegistry;

pub use build_doc::BuildDocumentWriter;
pub use error::OutputError;
pub use fasta::{PeptideFastaWriter, FASTA_LINE_WIDTH};
pub use table::{SummaryTableWriter, SUMMARY_COLUMNS};

mod build_doc;
mod error;
mod fasta;
mod table;

#[cfg(test)]
mod tests;

/// Probabilities are written with four decimals
pub fn format_probability(p: f64) -> String {
    format!("{:.4}", p)
}

/// Sibling-peptide totals are written with two decimals
pub fn format_siblings(n: f64) -> String {
    format!("{:.2}", n)
}

/// Paths of the files written by an [`OutputSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Flat summary table
    pub table: PathBuf,
    /// Nested build document
    pub build_document: PathBuf,
    /// Peptide FASTA
    pub fasta: PathBuf,
}

impl OutputPaths {
    /// Paths for `prefix` inside `dir`
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            table: dir.join(format!("{}.tsv", prefix)),
            build_document: dir.join(format!("{}.PAxml", prefix)),
            fasta: dir.join(format!("{}.fasta", prefix)),
        }
    }
}

/// The three output writers of a build, fed one summary at a time
pub struct OutputSet<'a> {
    table: SummaryTableWriter<BufWriter<File>>,
    build_document: BuildDocumentWriter<BufWriter<File>>,
    fasta: PeptideFastaWriter<BufWriter<File>>,
    biosequences: &'a BiosequenceRegistry,
    paths: OutputPaths,
    unresolved: usize,
}

impl<'a> OutputSet<'a> {
    /// Create every output file
    pub fn create(
        paths: OutputPaths,
        searched: &BTreeSet<ExperimentId>,
        biosequences: &'a BiosequenceRegistry,
    ) -> Result<Self, OutputError> {
        let table = SummaryTableWriter::new(BufWriter::new(File::create(&paths.table)?), searched)?;
        let build_document =
            BuildDocumentWriter::new(BufWriter::new(File::create(&paths.build_document)?))?;
        let fasta = PeptideFastaWriter::new(BufWriter::new(File::create(&paths.fasta)?));
        Ok(Self {
            table,
            build_document,
            fasta,
            biosequences,
            paths,
            unresolved: 0,
        })
    }

    /// Write one summary to every output
    pub fn write(&mut self, summary: &PeptideSummary) -> Result<(), OutputError> {
        let attributes = self.biosequences.attributes_for(&summary.protein_name);
        if attributes.is_none() && self.biosequences.is_loaded() {
            self.unresolved += 1;
        }
        self.table.write(summary, attributes)?;
        self.build_document.write_summary(summary, attributes)?;
        self.fasta.write(summary)
    }

    /// Summaries whose protein had no biosequence attributes
    pub fn unresolved_biosequences(&self) -> usize {
        self.unresolved
    }

    /// Flush and close every output
    pub fn finish(self) -> Result<OutputPaths, OutputError> {
        debug!(
            "Closing outputs: {} table rows, {} FASTA entries",
            self.table.rows(),
            self.fasta.entries()
        );
        self.table.finish()?;
        self.build_document.finish()?;
        self.fasta.finish()?;
        Ok(self.paths)
    }
}
