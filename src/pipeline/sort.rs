use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use log::info;

use super::PipelineError;
use crate::cache::{CacheError, CorrectedRecordWriter, RecordReader};
use crate::model::IdentificationRecord;

/// Total-order sort of corrected-record files by
/// `(peptide_sequence, experiment_id)`, compared byte-wise
pub trait RecordSorter {
    /// Sort the union of `inputs` into `output`; returns the number of records
    fn sort(&self, inputs: &[PathBuf], output: &Path) -> Result<usize, PipelineError>;
}

/// Sorts in memory; the order matches a byte-wise sort of the two leading
/// text columns
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemorySorter;

/// Byte-wise order on peptide sequence, then on the experiment id as text
pub fn record_order(a: &IdentificationRecord, b: &IdentificationRecord) -> Ordering {
    a.stripped_sequence
        .as_bytes()
        .cmp(b.stripped_sequence.as_bytes())
        .then_with(|| {
            a.experiment_id
                .to_string()
                .as_bytes()
                .cmp(b.experiment_id.to_string().as_bytes())
        })
}

impl RecordSorter for InMemorySorter {
    fn sort(&self, inputs: &[PathBuf], output: &Path) -> Result<usize, PipelineError> {
        let mut records = Vec::new();
        for path in inputs {
            let reader = RecordReader::open(path).map_err(|source| PipelineError::Cache {
                path: path.clone(),
                source,
            })?;
            for record in reader {
                records.push(record.map_err(|source| PipelineError::Cache {
                    path: path.clone(),
                    source,
                })?);
            }
        }

        records.sort_by(record_order);

        let cache_error = |source: CacheError| PipelineError::Cache {
            path: output.to_path_buf(),
            source,
        };
        let mut writer = CorrectedRecordWriter::create(output).map_err(cache_error)?;
        for record in &records {
            writer.write_record(record).map_err(cache_error)?;
        }
        writer.finish().map_err(cache_error)?;

        info!("Sorted {} records into {}", records.len(), output.display());
        Ok(records.len())
    }
}
