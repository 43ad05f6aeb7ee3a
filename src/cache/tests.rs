use super::*;
use crate::model::ProteinAdjustment;
use std::io::Cursor;
use tempfile::tempdir;

fn record(experiment_id: ExperimentId, sequence: &str, probability: f64) -> IdentificationRecord {
    IdentificationRecord {
        experiment_id,
        spectrum_id: format!("run.{}.{}.2", sequence.len(), experiment_id),
        peptide_accession: Some("PAp00000042".to_string()),
        stripped_sequence: sequence.to_string(),
        preceding_residue: "K".to_string(),
        modified_sequence: sequence.to_string(),
        following_residue: "-".to_string(),
        charge: Some(2),
        probability: Some(probability),
        mass_difference: Some(-0.013),
        protein_name: "sp|P02768|ALBU_HUMAN".to_string(),
        adjustment: None,
    }
}

#[test]
fn test_checkpoint_paths() {
    let cache = IdentificationCache::new("/work");
    assert_eq!(
        cache.checkpoint_path(12),
        PathBuf::from("/work/identlist_template_12.tsv")
    );
    assert_eq!(cache.corrected_path(12), PathBuf::from("/work/identlist_12.tsv"));
}

#[test]
fn test_checkpoint_store_and_load() {
    let dir = tempdir().unwrap();
    let cache = IdentificationCache::new(dir.path());
    assert!(cache.load(3).unwrap().is_none());

    let records = vec![
        record(3, "PEPTIDEK", 0.97),
        IdentificationRecord::unmatched(3, "run.00007.00007.3".to_string(), Some(3)),
    ];
    let path = cache.store(3, &records).unwrap();
    assert!(cache.has_checkpoint(3));

    let text = std::fs::read_to_string(&path).unwrap();
    let first_line = text.lines().next().unwrap();
    assert_eq!(first_line.split('\t').count(), CHECKPOINT_COLUMNS.len());
    assert!(!text.contains("search_batch_id"));

    let loaded = cache.load(3).unwrap().unwrap();
    assert_eq!(loaded, records);
    assert!(loaded[1].is_unmatched());
    assert_eq!(loaded[1].peptide_accession, None);
}

#[test]
fn test_checkpoint_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let cache = IdentificationCache::new(dir.path());
    cache.store(1, &[record(1, "AAAGK", 0.95)]).unwrap();
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);
}

#[test]
fn test_corrected_writer_header_and_fields() {
    let mut adjusted = record(5, "PEPTIDEK", 1.0);
    adjusted.adjustment = Some(ProteinAdjustment {
        adjusted_probability: Some(0.99),
        n_adjusted_observations: Some(4),
        n_sibling_peptides: Some(2.5),
    });

    let mut writer = CorrectedRecordWriter::new(Vec::new()).unwrap();
    writer.write_record(&adjusted).unwrap();
    writer.write_record(&record(5, "AAAGK", 0.92)).unwrap();
    assert_eq!(writer.rows(), 2);
    let bytes = writer.finish().unwrap();
    let text = String::from_utf8(bytes).unwrap();

    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), CORRECTED_COLUMNS.join("\t"));
    let first: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(first.len(), CORRECTED_COLUMNS.len());
    assert_eq!(first[8], "1");
    assert_eq!(&first[11..], ["0.99", "4", "2.5"]);

    let second: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(&second[11..], ["", "", ""]);
}

#[test]
fn test_reader_skips_interleaved_header_rows() {
    let mut writer = CorrectedRecordWriter::new(Vec::new()).unwrap();
    writer.write_record(&record(1, "AAAGK", 0.95)).unwrap();
    let mut bytes = writer.finish().unwrap();

    let mut second = CorrectedRecordWriter::new(Vec::new()).unwrap();
    second.write_record(&record(2, "AAAGK", 0.91)).unwrap();
    bytes.extend(second.finish().unwrap());

    let mut reader = RecordReader::new(Cursor::new(bytes));
    let records: Vec<_> = reader.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(reader.header_rows(), 2);
    assert_eq!(records[1].experiment_id, 2);
    assert_eq!(
        records[0].adjustment,
        Some(ProteinAdjustment::default())
    );
}

#[test]
fn test_reader_rejects_bad_numbers() {
    let data = "1\ts1\t\tAAAGK\tK\tAAAGK\t-\t2\thigh\t0.0\tP1\n";
    let err = RecordReader::new(Cursor::new(data))
        .next()
        .unwrap()
        .unwrap_err();
    match err {
        CacheError::InvalidField { line, field, value } => {
            assert_eq!(line, 1);
            assert_eq!(field, "probability");
            assert_eq!(value, "high");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_reader_rejects_short_rows() {
    let data = "1\ts1\t\tAAAGK\n";
    let err = RecordReader::new(Cursor::new(data))
        .next()
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, CacheError::ShortRow { found: 4, .. }));
}
