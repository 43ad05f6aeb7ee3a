use std::io::Write;

use super::OutputError;
use crate::coalesce::PeptideSummary;

/// Line width of wrapped sequences
pub const FASTA_LINE_WIDTH: usize = 60;

/// Writes one `>accession` entry per peptide summary
pub struct PeptideFastaWriter<W: Write> {
    writer: W,
    entries: usize,
}

impl<W: Write> PeptideFastaWriter<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer, entries: 0 }
    }

    /// Write a summary; peptides without an accession are labelled by sequence
    pub fn write(&mut self, summary: &PeptideSummary) -> Result<(), OutputError> {
        let label = summary
            .peptide_accession
            .as_deref()
            .unwrap_or(&summary.peptide_sequence);
        writeln!(self.writer, ">{}", label)?;
        let bytes = summary.peptide_sequence.as_bytes();
        for chunk in bytes.chunks(FASTA_LINE_WIDTH) {
            self.writer.write_all(chunk)?;
            self.writer.write_all(b"\n")?;
        }
        self.entries += 1;
        Ok(())
    }

    /// Entries written
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Flush and return the inner writer
    pub fn finish(mut self) -> Result<W, OutputError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
