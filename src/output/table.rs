use std::collections::BTreeSet;
use std::io::Write;

use super::{format_probability, OutputError};
use crate::coalesce::{join_ids, PeptideSummary};
use crate::model::ExperimentId;
use crate::registry::BiosequenceAttributes;

/// Header of the flat summary table
pub const SUMMARY_COLUMNS: [&str; 11] = [
    "peptide_accession",
    "biosequence_gene_name",
    "biosequence_accession",
    "reference",
    "peptide",
    "n_peptides",
    "maximum_probability",
    "n_experiments",
    "observed_experiment_list",
    "biosequence_desc",
    "searched_experiment_list",
];

/// Writer for the flat, one-row-per-peptide summary table
pub struct SummaryTableWriter<W: Write> {
    writer: csv::Writer<W>,
    searched_experiments: String,
    rows: usize,
}

impl<W: Write> SummaryTableWriter<W> {
    /// Write the header; `searched` is every experiment of the build
    pub fn new(inner: W, searched: &BTreeSet<ExperimentId>) -> Result<Self, OutputError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(SUMMARY_COLUMNS)?;
        Ok(Self {
            writer,
            searched_experiments: join_ids(searched),
            rows: 0,
        })
    }

    /// Write one summary. Missing biosequence attributes become empty fields.
    pub fn write(
        &mut self,
        summary: &PeptideSummary,
        attributes: Option<&BiosequenceAttributes>,
    ) -> Result<(), OutputError> {
        let (gene_name, accession, description) = match attributes {
            Some(a) => (a.gene_name.as_str(), a.accession.as_str(), a.description.as_str()),
            None => ("", "", ""),
        };
        self.writer.write_record([
            summary.peptide_accession.as_deref().unwrap_or_default(),
            gene_name,
            accession,
            summary.protein_name.as_str(),
            summary.peptide_sequence.as_str(),
            summary.n_instances.to_string().as_str(),
            format_probability(summary.best_probability).as_str(),
            summary.n_experiments().to_string().as_str(),
            summary.experiment_list().as_str(),
            description,
            self.searched_experiments.as_str(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the inner writer
    pub fn finish(mut self) -> Result<W, OutputError> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| OutputError::IoError(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}
