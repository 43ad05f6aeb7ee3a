//! # Identification Cache
//!
//! Tab-delimited files that carry identification records between the stages
//! of a build:
//!
//! - the **checkpoint** (`identlist_template_<id>.tsv`): the parser's output
//!   for one experiment, [`CHECKPOINT_COLUMNS`] fields per line and no header.
//!   When it exists, re-parsing the identification document is skipped and
//!   the file is trusted as-is.
//! - the **corrected-record file** (`identlist_<id>.tsv`): the merger's
//!   output, the checkpoint fields followed by the three adjustment fields,
//!   with a [`CORRECTED_COLUMNS`] header row.
//!
//! Checkpoints are written to a temporary file in the destination directory
//! and renamed into place, so an interrupted run never leaves a truncated
//! checkpoint behind to be trusted by the next one.
//!
//! [`RecordReader`] reads either format. Rows whose probability column holds
//! the literal `probability` are header rows (one per concatenated file in a
//! merged list) and are skipped.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::{ExperimentId, IdentificationRecord};

pub use error::CacheError;

mod error;
mod rows;

#[cfg(test)]
mod tests;

/// Columns of a checkpoint row
pub const CHECKPOINT_COLUMNS: [&str; 11] = [
    "search_batch_id",
    "spectrum_query",
    "peptide_accession",
    "peptide_sequence",
    "preceding_residue",
    "modified_peptide_sequence",
    "following_residue",
    "charge",
    "probability",
    "massdiff",
    "protein_name",
];

/// Header of a corrected-record file
pub const CORRECTED_COLUMNS: [&str; 14] = [
    "search_batch_id",
    "spectrum_query",
    "peptide_accession",
    "peptide_sequence",
    "preceding_residue",
    "modified_peptide_sequence",
    "following_residue",
    "charge",
    "probability",
    "massdiff",
    "protein_name",
    "adjusted_probability",
    "n_adjusted_observations",
    "n_sibling_peptides",
];

/// Per-experiment file locations inside a work directory
#[derive(Debug, Clone)]
pub struct IdentificationCache {
    dir: PathBuf,
}

impl IdentificationCache {
    /// Cache rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Work directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Checkpoint file of one experiment
    pub fn checkpoint_path(&self, experiment_id: ExperimentId) -> PathBuf {
        self.dir
            .join(format!("identlist_template_{}.tsv", experiment_id))
    }

    /// Corrected-record file of one experiment
    pub fn corrected_path(&self, experiment_id: ExperimentId) -> PathBuf {
        self.dir.join(format!("identlist_{}.tsv", experiment_id))
    }

    /// True when a checkpoint already exists for the experiment
    pub fn has_checkpoint(&self, experiment_id: ExperimentId) -> bool {
        self.checkpoint_path(experiment_id).is_file()
    }

    /// Load a checkpoint, or `None` when it does not exist
    pub fn load(
        &self,
        experiment_id: ExperimentId,
    ) -> Result<Option<Vec<IdentificationRecord>>, CacheError> {
        let path = self.checkpoint_path(experiment_id);
        if !path.is_file() {
            return Ok(None);
        }
        read_records(&path).map(Some)
    }

    /// Write a checkpoint atomically
    pub fn store(
        &self,
        experiment_id: ExperimentId,
        records: &[IdentificationRecord],
    ) -> Result<PathBuf, CacheError> {
        let path = self.checkpoint_path(experiment_id);
        write_checkpoint(&path, records)?;
        Ok(path)
    }
}

fn tsv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(inner)
}

/// Write checkpoint rows to `path` through a temporary file in the same directory
pub fn write_checkpoint(path: &Path, records: &[IdentificationRecord]) -> Result<(), CacheError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = tsv_writer(BufWriter::new(temp.as_file_mut()));
        for record in records {
            writer.write_record(rows::record_fields(record, false))?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

/// Read every record of a checkpoint or corrected-record file
pub fn read_records(path: &Path) -> Result<Vec<IdentificationRecord>, CacheError> {
    RecordReader::open(path)?.collect()
}

/// Streaming writer for corrected-record files
pub struct CorrectedRecordWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl CorrectedRecordWriter<BufWriter<File>> {
    /// Create (or truncate) a corrected-record file
    pub fn create(path: &Path) -> Result<Self, CacheError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CorrectedRecordWriter<W> {
    /// Wrap a writer and emit the header row
    pub fn new(inner: W) -> Result<Self, CacheError> {
        let mut writer = tsv_writer(inner);
        writer.write_record(CORRECTED_COLUMNS)?;
        Ok(Self { writer, rows: 0 })
    }

    /// Append one record with its adjustment fields
    pub fn write_record(&mut self, record: &IdentificationRecord) -> Result<(), CacheError> {
        self.writer.write_record(rows::record_fields(record, true))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the inner writer
    pub fn finish(self) -> Result<W, CacheError> {
        self.writer
            .into_inner()
            .map_err(|e| CacheError::IoError(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

/// Iterator over the records of a checkpoint or corrected-record file
pub struct RecordReader<R: Read> {
    rows: csv::StringRecordsIntoIter<R>,
    header_rows: usize,
}

impl RecordReader<BufReader<File>> {
    /// Open a file for reading
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> RecordReader<R> {
    /// Read records from any source
    pub fn new(inner: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(inner);
        Self {
            rows: reader.into_records(),
            header_rows: 0,
        }
    }

    /// Header rows skipped so far
    pub fn header_rows(&self) -> usize {
        self.header_rows
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<IdentificationRecord, CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e.into())),
            };
            if rows::is_header_row(&row) {
                self.header_rows += 1;
                continue;
            }
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            return Some(rows::parse_record(&row, line));
        }
    }
}
