//! # Spectral Library Lookup
//!
//! Reads the peptide/probability pairs of a consensus spectral library in the
//! line-oriented text format:
//!
//! ```text
//! ### header lines start with '#'
//! Name: PEM[147]PTIDEK/2
//! LibID: 0
//! Comment: Mods=1/3,M,Oxidation Nreps=4/5 Prob=0.9987 Protein=1/P12345
//! NumPeaks: 3
//! 175.1190    1000.0  y1/0.00
//! ...
//! ```
//!
//! `Name:` opens a record keyed by `modified_sequence/charge`, the `Prob=`
//! token of `Comment:` carries its probability and `NumPeaks:` closes it.
//! Peak lines are ignored. Only the highest probability per key is kept.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

/// Errors that can occur while reading a spectral library
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A `Prob=` token that is not a number
    #[error("Invalid probability '{value}' on line {line}")]
    InvalidProbability {
        /// 1-based line number
        line: usize,
        /// Raw token value
        value: String,
    },
}

/// Counters collected while reading a library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStats {
    /// Records closed by a `NumPeaks:` line
    pub records: usize,
    /// Records that carried no `Prob=` token
    pub without_probability: usize,
    /// `Name:` lines not followed by `NumPeaks:` before the next record
    pub incomplete: usize,
}

#[derive(Debug)]
struct PendingRecord {
    key: String,
    probability: Option<f64>,
}

/// Best probability per `modified_sequence/charge` key
#[derive(Debug, Clone, Default)]
pub struct SpectralLibrary {
    best: HashMap<String, f64>,
    stats: LibraryStats,
}

impl SpectralLibrary {
    /// Read a library file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LibraryError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a library from any buffered source
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LibraryError> {
        let mut library = Self::default();
        let mut pending: Option<PendingRecord> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix("Name:") {
                if pending.is_some() {
                    library.stats.incomplete += 1;
                }
                pending = Some(PendingRecord {
                    key: name.trim().to_string(),
                    probability: None,
                });
            } else if let Some(comment) = line.strip_prefix("Comment:") {
                if let Some(record) = pending.as_mut() {
                    record.probability = comment_probability(comment, index + 1)?;
                }
            } else if line.starts_with("NumPeaks:") {
                if let Some(record) = pending.take() {
                    library.close(record);
                }
            }
        }
        if pending.is_some() {
            library.stats.incomplete += 1;
        }

        debug!(
            "Spectral library: {} records, {} distinct peptide keys",
            library.stats.records,
            library.best.len()
        );
        Ok(library)
    }

    fn close(&mut self, record: PendingRecord) {
        self.stats.records += 1;
        let probability = match record.probability {
            Some(p) => p,
            None => {
                self.stats.without_probability += 1;
                0.0
            }
        };
        let best = self.best.entry(record.key).or_insert(probability);
        if probability > *best {
            *best = probability;
        }
    }

    /// Highest probability recorded for `key`
    pub fn best_probability(&self, key: &str) -> Option<f64> {
        self.best.get(key).copied()
    }

    /// True when the library holds a record for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.best.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.best.len()
    }

    /// True when the library holds no records
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Counters from reading the library
    pub fn stats(&self) -> LibraryStats {
        self.stats
    }
}

fn comment_probability(comment: &str, line: usize) -> Result<Option<f64>, LibraryError> {
    match comment
        .split_whitespace()
        .find_map(|token| token.strip_prefix("Prob="))
    {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| LibraryError::InvalidProbability {
                line,
                value: raw.to_string(),
            }),
    }
}
