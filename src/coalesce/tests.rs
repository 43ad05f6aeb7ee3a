use super::*;
use crate::model::ProteinAdjustment;

fn record(
    experiment_id: u32,
    sequence: &str,
    modified: &str,
    charge: u8,
    probability: f64,
    adjusted: f64,
    observations: u32,
) -> IdentificationRecord {
    IdentificationRecord {
        experiment_id,
        spectrum_id: format!("run{}.{}", experiment_id, modified),
        peptide_accession: Some("PAp00000007".to_string()),
        stripped_sequence: sequence.to_string(),
        preceding_residue: "R".to_string(),
        modified_sequence: modified.to_string(),
        following_residue: "A".to_string(),
        charge: Some(charge),
        probability: Some(probability),
        mass_difference: Some(0.0),
        protein_name: "P1".to_string(),
        adjustment: Some(ProteinAdjustment {
            adjusted_probability: Some(adjusted),
            n_adjusted_observations: Some(observations),
            n_sibling_peptides: Some(0.5),
        }),
    }
}

#[test]
fn test_same_experiment_same_form_counts_once() {
    let summaries = coalesce(vec![
        record(4, "PEPTIDEK", "PEPTIDEK", 2, 0.95, 0.97, 6),
        record(4, "PEPTIDEK", "PEPTIDEK", 2, 0.99, 0.98, 6),
    ])
    .unwrap();

    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.n_instances, 2);
    assert_eq!(summary.n_adjusted_observations, 6);
    assert_eq!(summary.n_sibling_peptides, 0.5);
    assert_eq!(summary.best_probability, 0.99);
    // only the first record of the experiment contributes its adjusted value
    assert_eq!(summary.best_adjusted_probability, Some(0.97));

    let form = &summary.modified_instances["PEPTIDEK"][&Some(2)];
    assert_eq!(form.n_instances, 2);
    assert_eq!(form.n_adjusted_observations, 6);
    assert_eq!(form.best_probability, 0.99);
}

#[test]
fn test_forms_and_experiments() {
    let summaries = coalesce(vec![
        record(1, "PEMPTIDEK", "PEM[147]PTIDEK", 2, 0.91, 0.93, 2),
        record(1, "PEMPTIDEK", "PEMPTIDEK", 2, 0.92, 0.94, 3),
        record(2, "PEMPTIDEK", "PEMPTIDEK", 2, 0.96, 0.99, 4),
        record(2, "PEMPTIDEK", "PEMPTIDEK", 3, 0.90, 0.95, 1),
    ])
    .unwrap();

    let summary = &summaries[0];
    assert_eq!(summary.n_instances, 4);
    assert_eq!(summary.n_adjusted_observations, 2 + 3 + 4 + 1);
    assert_eq!(summary.n_sibling_peptides, 2.0);
    assert_eq!(summary.best_adjusted_probability, Some(0.99));
    assert_eq!(summary.n_experiments(), 2);
    assert_eq!(summary.experiment_list(), "1,2");

    let forms: Vec<_> = summary
        .forms()
        .map(|(sequence, charge, form)| (sequence.to_string(), charge, form.n_instances))
        .collect();
    // bytewise: 'P' sorts before '['
    assert_eq!(
        forms,
        vec![
            ("PEMPTIDEK".to_string(), Some(2), 2),
            ("PEMPTIDEK".to_string(), Some(3), 1),
            ("PEM[147]PTIDEK".to_string(), Some(2), 1),
        ]
    );
    let doubly_observed = &summary.modified_instances["PEMPTIDEK"][&Some(2)];
    assert_eq!(doubly_observed.experiments.len(), 2);
    assert_eq!(doubly_observed.n_adjusted_observations, 7);
}

#[test]
fn test_single_record_group() {
    let summaries = coalesce(vec![
        record(3, "AAAGK", "AAAGK", 1, 0.97, 0.98, 1),
        record(1, "CCCGK", "CCCGK", 2, 0.93, 0.95, 1),
    ])
    .unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].peptide_sequence, "AAAGK");
    assert_eq!(summaries[0].n_instances, 1);
    assert_eq!(summaries[0].peptide_accession.as_deref(), Some("PAp00000007"));
    assert_eq!(summaries[1].experiment_list(), "1");
}

#[test]
fn test_streaming_flush_points() {
    let mut coalescer = Coalescer::new();
    assert!(coalescer
        .push(record(1, "AAAGK", "AAAGK", 2, 0.9, 0.9, 1))
        .unwrap()
        .is_none());
    assert!(coalescer
        .push(IdentificationRecord::unmatched(1, "s9".to_string(), None))
        .unwrap()
        .is_none());
    let flushed = coalescer
        .push(record(1, "CCCGK", "CCCGK", 2, 0.9, 0.9, 1))
        .unwrap()
        .unwrap();
    assert_eq!(flushed.peptide_sequence, "AAAGK");

    let last = coalescer.finish().unwrap();
    assert_eq!(last.peptide_sequence, "CCCGK");
    assert!(coalescer.finish().is_none());

    let stats = coalescer.stats();
    assert_eq!(stats.records, 2);
    assert_eq!(stats.unmatched, 1);
    assert_eq!(stats.summaries, 2);
}

#[test]
fn test_unsorted_input_is_rejected() {
    let err = coalesce(vec![
        record(1, "CCCGK", "CCCGK", 2, 0.9, 0.9, 1),
        record(1, "DDDGK", "DDDGK", 2, 0.9, 0.9, 1),
        record(1, "AAAGK", "AAAGK", 2, 0.9, 0.9, 1),
    ])
    .unwrap_err();
    match err {
        CoalesceError::UnsortedInput { previous, found } => {
            assert_eq!(previous, "DDDGK");
            assert_eq!(found, "AAAGK");
        }
    }
}

#[test]
fn test_missing_adjustment_counts_as_zero() {
    let mut bare = record(1, "AAAGK", "AAAGK", 2, 0.95, 0.0, 0);
    bare.adjustment = None;
    let summaries = coalesce(vec![bare]).unwrap();
    assert_eq!(summaries[0].n_adjusted_observations, 0);
    assert_eq!(summaries[0].best_adjusted_probability, None);
}
