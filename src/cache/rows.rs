use std::str::FromStr;

use csv::StringRecord;

use super::{CacheError, CHECKPOINT_COLUMNS, CORRECTED_COLUMNS};
use crate::model::{IdentificationRecord, ProteinAdjustment};

/// Render a record as checkpoint fields, optionally followed by the
/// adjustment fields of the corrected-record file.
pub(super) fn record_fields(record: &IdentificationRecord, with_adjustment: bool) -> Vec<String> {
    let mut fields = Vec::with_capacity(CORRECTED_COLUMNS.len());
    fields.push(record.experiment_id.to_string());
    fields.push(record.spectrum_id.clone());
    fields.push(record.peptide_accession.clone().unwrap_or_default());
    fields.push(record.stripped_sequence.clone());
    fields.push(record.preceding_residue.clone());
    fields.push(record.modified_sequence.clone());
    fields.push(record.following_residue.clone());
    fields.push(optional(record.charge));
    fields.push(optional(record.probability));
    fields.push(optional(record.mass_difference));
    fields.push(record.protein_name.clone());

    if with_adjustment {
        let adjustment = record.adjustment.clone().unwrap_or_default();
        fields.push(optional(adjustment.adjusted_probability));
        fields.push(optional(adjustment.n_adjusted_observations));
        fields.push(optional(adjustment.n_sibling_peptides));
    }
    fields
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// True for a row whose probability column holds the header literal
pub(super) fn is_header_row(row: &StringRecord) -> bool {
    row.get(8).map(str::trim) == Some("probability")
}

/// Decode one row. Adjustment fields are read when present.
pub(super) fn parse_record(row: &StringRecord, line: u64) -> Result<IdentificationRecord, CacheError> {
    if row.len() < CHECKPOINT_COLUMNS.len() {
        return Err(CacheError::ShortRow {
            line,
            found: row.len(),
            expected: CHECKPOINT_COLUMNS.len(),
        });
    }

    let text = |i: usize| row.get(i).unwrap_or_default().to_string();

    let experiment_id = required(row, 0, line)?;
    let mut record = IdentificationRecord {
        experiment_id,
        spectrum_id: text(1),
        peptide_accession: Some(text(2)).filter(|a| !a.is_empty()),
        stripped_sequence: text(3),
        preceding_residue: text(4),
        modified_sequence: text(5),
        following_residue: text(6),
        charge: field(row, 7, line)?,
        probability: field(row, 8, line)?,
        mass_difference: field(row, 9, line)?,
        protein_name: text(10),
        adjustment: None,
    };

    if row.len() >= CORRECTED_COLUMNS.len() {
        record.adjustment = Some(ProteinAdjustment {
            adjusted_probability: field(row, 11, line)?,
            n_adjusted_observations: field(row, 12, line)?,
            n_sibling_peptides: field(row, 13, line)?,
        });
    }
    Ok(record)
}

fn field<T: FromStr>(row: &StringRecord, index: usize, line: u64) -> Result<Option<T>, CacheError> {
    let raw = row.get(index).unwrap_or_default().trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| CacheError::InvalidField {
        line,
        field: CORRECTED_COLUMNS[index],
        value: raw.to_string(),
    })
}

fn required<T: FromStr>(row: &StringRecord, index: usize, line: u64) -> Result<T, CacheError> {
    field(row, index, line)?.ok_or_else(|| CacheError::InvalidField {
        line,
        field: CORRECTED_COLUMNS[index],
        value: String::new(),
    })
}
