//! # Initial-Probability Index
//!
//! First-pass accumulator of the best spectrum-level probability seen for a
//! peptide across every identification document of a build. It is keyed both
//! by stripped sequence and by the `charge-modified_sequence` key, and is
//! read-only once the second pass starts.

use std::collections::HashMap;

use crate::model::IdentificationRecord;

/// Running maximum probability per peptide key
#[derive(Debug, Clone, Default)]
pub struct InitialProbabilityIndex {
    best: HashMap<String, f64>,
}

impl InitialProbabilityIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the maximum stored under `key` to `probability` if it is larger
    pub fn record(&mut self, key: &str, probability: f64) {
        if probability.is_nan() || probability < 0.0 {
            return;
        }
        match self.best.get_mut(key) {
            Some(best) => {
                if probability > *best {
                    *best = probability;
                }
            }
            None => {
                self.best.insert(key.to_string(), probability);
            }
        }
    }

    /// Record a parsed identification under both of its keys.
    ///
    /// Sentinel records and records without a probability are ignored.
    pub fn observe(&mut self, record: &IdentificationRecord) {
        let probability = match record.probability {
            Some(p) if !record.is_unmatched() => p,
            _ => return,
        };
        self.record(&record.stripped_sequence, probability);
        if let Some(key) = record.unstripped_key() {
            self.record(&key, probability);
        }
    }

    /// Best probability recorded for `key`
    pub fn best_for(&self, key: &str) -> Option<f64> {
        self.best.get(key).copied()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.best.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

impl<'a> Extend<&'a IdentificationRecord> for InitialProbabilityIndex {
    fn extend<T: IntoIterator<Item = &'a IdentificationRecord>>(&mut self, iter: T) {
        for record in iter {
            self.observe(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(charge: Option<u8>, modified: &str, stripped: &str, p: f64) -> IdentificationRecord {
        IdentificationRecord {
            experiment_id: 1,
            stripped_sequence: stripped.to_string(),
            modified_sequence: modified.to_string(),
            charge,
            probability: Some(p),
            ..Default::default()
        }
    }

    #[test]
    fn test_running_maximum() {
        let mut index = InitialProbabilityIndex::new();
        index.record("AAAGK", 0.7);
        index.record("AAAGK", 0.95);
        index.record("AAAGK", 0.8);
        assert_eq!(index.best_for("AAAGK"), Some(0.95));
        assert_eq!(index.best_for("CCCGK"), None);
    }

    #[test]
    fn test_observe_uses_both_keys() {
        let mut index = InitialProbabilityIndex::new();
        index.extend(&[
            record(Some(2), "PEM[147]PTIDE", "PEMPTIDE", 0.91),
            record(Some(3), "PEMPTIDE", "PEMPTIDE", 0.97),
        ]);
        assert_eq!(index.best_for("PEMPTIDE"), Some(0.97));
        assert_eq!(index.best_for("2-PEM[147]PTIDE"), Some(0.91));
        assert_eq!(index.best_for("3-PEMPTIDE"), Some(0.97));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_ignores_sentinels_and_garbage() {
        let mut index = InitialProbabilityIndex::new();
        index.observe(&IdentificationRecord::unmatched(1, "s1".to_string(), Some(2)));
        index.record("AAAGK", f64::NAN);
        index.record("AAAGK", -1.0);
        assert!(index.is_empty());
    }
}
