use super::*;
use crate::model::ProteinInferenceEntry;
use std::io::Cursor;

fn record(experiment_id: u32, sequence: &str, charge: u8, probability: f64) -> IdentificationRecord {
    IdentificationRecord {
        experiment_id,
        spectrum_id: format!("run.{}.{}", experiment_id, sequence),
        stripped_sequence: sequence.to_string(),
        modified_sequence: sequence.to_string(),
        charge: Some(charge),
        probability: Some(probability),
        protein_name: "P1".to_string(),
        ..Default::default()
    }
}

fn entry(initial: f64, adjusted: Option<f64>) -> ProteinInferenceEntry {
    ProteinInferenceEntry {
        experiment_id: None,
        charge: Some(2),
        initial_probability: initial,
        nsp_adjusted_probability: adjusted,
        n_sibling_peptides: Some(1.5),
        n_adjusted_observations: Some(3),
        protein_name: "P1".to_string(),
    }
}

fn inference(pairs: &[(&str, ProteinInferenceEntry)]) -> ProteinInferenceMap {
    let mut map = ProteinInferenceMap::new();
    for (key, entry) in pairs {
        map.insert(key.to_string(), entry.clone());
    }
    map
}

fn options(scope: InferenceScope, threshold: f64) -> MergeOptions<'static> {
    MergeOptions {
        probability_threshold: threshold,
        scope,
        ..Default::default()
    }
}

#[test]
fn test_adjustment_is_clamped_to_one() {
    let map = inference(&[("2-PEPTIDEK", entry(0.5, Some(0.65)))]);
    let merger = ProteinAdjustmentMerger::new(&map, options(InferenceScope::Master, 0.9));

    let outcome = merger.merge(vec![record(1, "PEPTIDEK", 2, 0.95)]);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].probability, Some(1.0));
}

#[test]
fn test_master_mode_rescales_probability() {
    let map = inference(&[("2-PEPTIDEK", entry(0.8, Some(0.88)))]);
    let merger = ProteinAdjustmentMerger::new(&map, options(InferenceScope::Master, 0.5));

    let outcome = merger.merge(vec![record(1, "PEPTIDEK", 2, 0.6)]);
    let p = outcome.records[0].probability.unwrap();
    assert!((p - 0.66).abs() < 1e-12, "got {p}");

    let adjustment = outcome.records[0].adjustment.as_ref().unwrap();
    assert_eq!(adjustment.adjusted_probability, Some(0.88));
    assert_eq!(adjustment.n_adjusted_observations, Some(3));
    assert_eq!(adjustment.n_sibling_peptides, Some(1.5));
}

#[test]
fn test_per_experiment_mode_rescales_probability() {
    let map = inference(&[("2-PEPTIDEK", entry(0.8, Some(0.96)))]);
    let merger = ProteinAdjustmentMerger::new(&map, options(InferenceScope::PerExperiment, 0.9));

    let outcome = merger.merge(vec![record(1, "PEPTIDEK", 2, 0.8)]);
    let p = outcome.records[0].probability.unwrap();
    assert!((p - 0.96).abs() < 1e-12, "got {p}");
    assert_eq!(
        outcome.records[0].adjustment.as_ref().unwrap().adjusted_probability,
        Some(0.96)
    );
}

#[test]
fn test_per_experiment_weak_protein_evidence_fails_gate() {
    let map = inference(&[("2-PEPTIDEK", entry(0.95, Some(0.20)))]);
    let merger = ProteinAdjustmentMerger::new(&map, options(InferenceScope::PerExperiment, 0.9));

    let outcome = merger.merge(vec![record(1, "PEPTIDEK", 2, 0.95)]);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.below_threshold, 1);
    assert_eq!(outcome.stats.unadjusted, 0);
}

#[test]
fn test_stripped_key_fallback() {
    let map = inference(&[("PEPTIDEK", entry(0.5, Some(0.6)))]);
    let merger = ProteinAdjustmentMerger::new(&map, options(InferenceScope::Master, 0.0));

    let outcome = merger.merge(vec![record(1, "PEPTIDEK", 3, 0.5)]);
    let p = outcome.records[0].probability.unwrap();
    assert!((p - 0.6).abs() < 1e-12, "got {p}");
    assert_eq!(outcome.stats.unassigned, 0);
}

#[test]
fn test_index_value_is_deflated() {
    let mut index = InitialProbabilityIndex::new();
    index.record("2-PEPTIDEK", 1.0);

    let map = inference(&[("2-PEPTIDEK", entry(0.5, Some(0.999)))]);
    let merger = ProteinAdjustmentMerger::new(
        &map,
        MergeOptions {
            index: Some(&index),
            ..options(InferenceScope::Master, 0.0)
        },
    );

    // factor = 0.999 / (1.0 - 0.001) = 1.0, not 0.999 / 0.5
    let outcome = merger.merge(vec![record(1, "PEPTIDEK", 2, 0.7)]);
    let p = outcome.records[0].probability.unwrap();
    assert!((p - 0.7).abs() < 1e-12, "got {p}");
}

#[test]
fn test_missing_entry_keeps_probability_and_counts() {
    let map = ProteinInferenceMap::new();
    let merger = ProteinAdjustmentMerger::new(&map, options(InferenceScope::Master, 0.9));

    let outcome = merger.merge(vec![record(1, "PEPTIDEK", 2, 0.93)]);
    assert_eq!(outcome.records[0].probability, Some(0.93));
    assert_eq!(outcome.stats.unassigned, 1);
    assert_eq!(outcome.stats.warnings(), 1);
    assert_eq!(outcome.records[0].adjustment, Some(ProteinAdjustment::default()));
}

#[test]
fn test_zero_initial_probability_skips_factor() {
    let map = inference(&[("2-PEPTIDEK", entry(0.0, Some(0.9)))]);
    let merger = ProteinAdjustmentMerger::new(&map, options(InferenceScope::Master, 0.9));

    let outcome = merger.merge(vec![record(1, "PEPTIDEK", 2, 0.91)]);
    assert_eq!(outcome.records[0].probability, Some(0.91));
    assert_eq!(outcome.stats.unadjusted, 1);
    // adjustment fields are attached even without a factor
    assert_eq!(
        outcome.records[0].adjustment.as_ref().unwrap().adjusted_probability,
        Some(0.9)
    );
}

#[test]
fn test_library_filter_in_master_mode() {
    let text = "Name: PEPTIDEK/2\nComment: Prob=0.99\nNumPeaks: 0\n";
    let library = SpectralLibrary::from_reader(Cursor::new(text)).unwrap();
    let map = inference(&[
        ("2-PEPTIDEK", entry(0.9, Some(0.95))),
        ("2-AAAGK", entry(0.9, Some(0.95))),
    ]);
    let merger = ProteinAdjustmentMerger::new(
        &map,
        MergeOptions {
            library: Some(&library),
            ..options(InferenceScope::Master, 0.0)
        },
    );

    let outcome = merger.merge(vec![
        record(1, "PEPTIDEK", 2, 0.9),
        record(1, "AAAGK", 2, 0.9),
    ]);
    assert!(outcome.records[0].probability.unwrap() > 0.9);
    assert_eq!(outcome.records[1].probability, Some(LIBRARY_ABSENT_PROBABILITY));
    assert_eq!(outcome.stats.library_demoted, 1);
}

#[test]
fn test_decoy_correction_before_gate() {
    let map = ProteinInferenceMap::new();
    let merger = ProteinAdjustmentMerger::new(
        &map,
        MergeOptions {
            decoy_correction: Some(0.9),
            ..options(InferenceScope::PerExperiment, 0.9)
        },
    );

    let outcome = merger.merge(vec![
        record(1, "PEPTIDEK", 2, 0.95),
        record(1, "AAAGK", 2, 1.0),
    ]);
    assert_eq!(outcome.stats.below_threshold, 1);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].stripped_sequence, "AAAGK");
    assert_eq!(outcome.stats.decoy_corrected, 2);
}

#[test]
fn test_sentinels_and_gate() {
    let map = ProteinInferenceMap::new();
    let merger = ProteinAdjustmentMerger::new(&map, options(InferenceScope::PerExperiment, 0.9));

    let outcome = merger.merge(vec![
        IdentificationRecord::unmatched(1, "s0".to_string(), Some(2)),
        record(1, "PEPTIDEK", 2, 0.89),
        record(1, "AAAGK", 2, 0.9),
    ]);
    assert_eq!(outcome.stats.records, 3);
    assert_eq!(outcome.stats.unmatched, 1);
    assert_eq!(outcome.stats.below_threshold, 1);
    assert_eq!(outcome.stats.retained, 1);
}

#[test]
fn test_library_demotion_is_not_decoy_corrected() {
    let text = "Name: PEPTIDEK/2\nComment: Prob=0.99\nNumPeaks: 0\n";
    let library = SpectralLibrary::from_reader(Cursor::new(text)).unwrap();
    let map = ProteinInferenceMap::new();
    let merger = ProteinAdjustmentMerger::new(
        &map,
        MergeOptions {
            library: Some(&library),
            decoy_correction: Some(0.8),
            ..options(InferenceScope::Master, 0.0)
        },
    );

    let outcome = merger.merge(vec![
        record(1, "PEPTIDEK", 2, 0.9),
        record(1, "AAAGK", 2, 0.9),
    ]);
    let kept = outcome.records[0].probability.unwrap();
    assert!((kept - 0.72).abs() < 1e-12, "got {kept}");
    assert_eq!(outcome.records[1].probability, Some(LIBRARY_ABSENT_PROBABILITY));
    assert_eq!(outcome.stats.library_demoted, 1);
    assert_eq!(outcome.stats.decoy_corrected, 1);
}
