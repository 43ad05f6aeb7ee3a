//! # Cross-Experiment Coalescer
//!
//! Groups the corrected records of every experiment into one
//! [`PeptideSummary`] per distinct stripped peptide sequence.
//!
//! The input must already be in total order by peptide sequence (ties by
//! experiment id). The coalescer keeps only the group in progress: when a
//! record with a new sequence arrives, the finished group is handed back to
//! the caller and a new one starts. [`Coalescer::finish`] flushes the last
//! group.
//!
//! ```rust,ignore
//! let mut coalescer = Coalescer::new();
//! for record in records {
//!     if let Some(summary) = coalescer.push(record?)? {
//!         writer.write(&summary)?;
//!     }
//! }
//! if let Some(summary) = coalescer.finish() {
//!     writer.write(&summary)?;
//! }
//! ```

use crate::model::IdentificationRecord;

pub use error::CoalesceError;
pub use summary::{join_ids, ModifiedInstance, PeptideSummary};

mod error;
mod summary;

#[cfg(test)]
mod tests;

/// Counters collected while coalescing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalesceStats {
    /// Records folded into a summary
    pub records: usize,
    /// Sentinel records skipped
    pub unmatched: usize,
    /// Summaries produced
    pub summaries: usize,
}

/// Streaming group-by over records sorted by peptide sequence
#[derive(Debug, Default)]
pub struct Coalescer {
    current: Option<PeptideSummary>,
    previous_sequence: Option<String>,
    stats: CoalesceStats,
}

impl Coalescer {
    /// Create an empty coalescer
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record; returns the previous group when this record starts a new one
    pub fn push(
        &mut self,
        record: IdentificationRecord,
    ) -> Result<Option<PeptideSummary>, CoalesceError> {
        if record.is_unmatched() {
            self.stats.unmatched += 1;
            return Ok(None);
        }
        self.stats.records += 1;

        if let Some(current) = self.current.as_mut() {
            if current.peptide_sequence == record.stripped_sequence {
                current.add(&record);
                return Ok(None);
            }
        }

        if let Some(previous) = self.current_sequence() {
            if record.stripped_sequence.as_str() < previous {
                return Err(CoalesceError::UnsortedInput {
                    previous: previous.to_string(),
                    found: record.stripped_sequence,
                });
            }
        }

        let finished = self.current.replace(PeptideSummary::new(&record));
        if let Some(summary) = finished.as_ref() {
            self.previous_sequence = Some(summary.peptide_sequence.clone());
            self.stats.summaries += 1;
        }
        Ok(finished)
    }

    fn current_sequence(&self) -> Option<&str> {
        self.current
            .as_ref()
            .map(|summary| summary.peptide_sequence.as_str())
            .or(self.previous_sequence.as_deref())
    }

    /// Flush the group in progress
    pub fn finish(&mut self) -> Option<PeptideSummary> {
        let finished = self.current.take();
        if let Some(summary) = finished.as_ref() {
            self.previous_sequence = Some(summary.peptide_sequence.clone());
            self.stats.summaries += 1;
        }
        finished
    }

    /// Counters so far
    pub fn stats(&self) -> CoalesceStats {
        self.stats
    }
}

/// Coalesce a whole sorted sequence of records at once
pub fn coalesce<I>(records: I) -> Result<Vec<PeptideSummary>, CoalesceError>
where
    I: IntoIterator<Item = IdentificationRecord>,
{
    let mut coalescer = Coalescer::new();
    let mut summaries = Vec::new();
    for record in records {
        if let Some(summary) = coalescer.push(record)? {
            summaries.push(summary);
        }
    }
    summaries.extend(coalescer.finish());
    Ok(summaries)
}
