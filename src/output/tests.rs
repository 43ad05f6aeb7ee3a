use super::*;
use crate::coalesce::coalesce;
use crate::model::{IdentificationRecord, ProteinAdjustment};
use crate::registry::BiosequenceAttributes;
use std::io::Cursor;
use tempfile::tempdir;

fn summary() -> PeptideSummary {
    let record = |experiment_id: u32, charge: u8, probability: f64| IdentificationRecord {
        experiment_id,
        spectrum_id: format!("s{}", experiment_id),
        peptide_accession: Some("PAp00000001".to_string()),
        stripped_sequence: "PEPTIDEK".to_string(),
        preceding_residue: "K".to_string(),
        modified_sequence: "PEPTIDEK".to_string(),
        following_residue: "A".to_string(),
        charge: Some(charge),
        probability: Some(probability),
        mass_difference: None,
        protein_name: "sp|P02768|ALBU_HUMAN".to_string(),
        adjustment: Some(ProteinAdjustment {
            adjusted_probability: Some(0.99),
            n_adjusted_observations: Some(2),
            n_sibling_peptides: None,
        }),
    };
    coalesce(vec![record(1, 2, 0.95), record(2, 2, 0.97)])
        .unwrap()
        .remove(0)
}

#[test]
fn test_build_document_layout() {
    let mut doc = BuildDocumentWriter::new(Vec::new()).unwrap();
    doc.write_summary(&summary(), None).unwrap();
    let text = String::from_utf8(doc.finish().unwrap()).unwrap();

    let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<build>
    <peptide_instance
            original_protein_name="sp|P02768|ALBU_HUMAN"
            peptide_accession="PAp00000001"
            peptide_prev_aa="K"
            peptide_sequence="PEPTIDEK"
            peptide_next_aa="A"
            best_probability="0.9700"
            best_adjusted_probability="0.9900"
            n_observations="2"
            n_adjusted_observations="4"
            n_sibling_peptides="0.00"
            n_experiments="2"
            search_batch_ids="1,2">
        <modified_peptide_instance
                peptide_string="PEPTIDEK"
                charge_state="2"
                best_probability="0.9700"
                best_adjusted_probability="0.9900"
                n_observations="2"
                n_adjusted_observations="4"
                n_sibling_peptides="0.00"
                search_batch_ids="1,2"/>
    </peptide_instance>
</build>
"#;
    assert_eq!(text, expected);
}

#[test]
fn test_build_document_carries_biosequence_attributes() {
    let attributes = BiosequenceAttributes {
        accession: "P02768".to_string(),
        gene_name: "ALB".to_string(),
        description: "Serum albumin".to_string(),
    };
    let mut doc = BuildDocumentWriter::new(Vec::new()).unwrap();
    doc.write_summary(&summary(), Some(&attributes)).unwrap();
    let text = String::from_utf8(doc.finish().unwrap()).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        &lines[3..7],
        &[
            "            original_protein_name=\"sp|P02768|ALBU_HUMAN\"",
            "            biosequence_accession=\"P02768\"",
            "            biosequence_gene_name=\"ALB\"",
            "            biosequence_desc=\"Serum albumin\"",
        ]
    );
    assert!(text.contains("            n_experiments=\"2\"\n"));
    // per-form elements do not repeat the protein attributes
    assert_eq!(text.matches("biosequence_gene_name").count(), 1);
}

#[test]
fn test_empty_attributes_are_omitted_and_escaped() {
    let mut doc = BuildDocumentWriter::new(Vec::new()).unwrap();
    doc.empty_element(
        "note",
        &[("empty", String::new()), ("text", "a<b & \"c\"".to_string())],
    )
    .unwrap();
    doc.empty_element("bare", &[("empty", String::new())]).unwrap();
    let text = String::from_utf8(doc.finish().unwrap()).unwrap();

    assert!(!text.contains("empty="));
    assert!(text.contains("            text=\"a&lt;b &amp; &quot;c&quot;\"/>"));
    assert!(text.contains("    <bare/>\n"));
}

#[test]
fn test_close_mismatch_is_an_error() {
    let mut doc = BuildDocumentWriter::new(Vec::new()).unwrap();
    doc.open_element("peptide_instance", &[]).unwrap();
    let err = doc.close_element("build").unwrap_err();
    assert!(matches!(
        err,
        OutputError::TagMismatch { ref expected, ref found }
            if expected.as_deref() == Some("peptide_instance") && found == "build"
    ));
    doc.close_element("peptide_instance").unwrap();
    doc.open_element("peptide_instance", &[]).unwrap();

    let err = doc.finish().unwrap_err();
    assert!(matches!(err, OutputError::UnclosedElements(ref open) if open == "peptide_instance"));
}

#[test]
fn test_summary_table_row() {
    let searched: BTreeSet<ExperimentId> = [1, 2, 3].into_iter().collect();
    let attributes = BiosequenceAttributes {
        accession: "P02768".to_string(),
        gene_name: "ALB".to_string(),
        description: "Serum albumin".to_string(),
    };

    let mut table = SummaryTableWriter::new(Vec::new(), &searched).unwrap();
    table.write(&summary(), Some(&attributes)).unwrap();
    table.write(&summary(), None).unwrap();
    assert_eq!(table.rows(), 2);
    let text = String::from_utf8(table.finish().unwrap()).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], SUMMARY_COLUMNS.join("\t"));
    assert_eq!(
        lines[1],
        "PAp00000001\tALB\tP02768\tsp|P02768|ALBU_HUMAN\tPEPTIDEK\t2\t0.9700\t2\t1,2\tSerum albumin\t1,2,3"
    );
    assert_eq!(
        lines[2],
        "PAp00000001\t\t\tsp|P02768|ALBU_HUMAN\tPEPTIDEK\t2\t0.9700\t2\t1,2\t\t1,2,3"
    );
}

#[test]
fn test_fasta_wraps_long_sequences() {
    let mut long = summary();
    long.peptide_accession = None;
    long.peptide_sequence = "A".repeat(FASTA_LINE_WIDTH + 5);

    let mut fasta = PeptideFastaWriter::new(Vec::new());
    fasta.write(&summary()).unwrap();
    fasta.write(&long).unwrap();
    assert_eq!(fasta.entries(), 2);
    let text = String::from_utf8(fasta.finish().unwrap()).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], ">PAp00000001");
    assert_eq!(lines[1], "PEPTIDEK");
    assert!(lines[2].starts_with(">AAAA"));
    assert_eq!(lines[3].len(), FASTA_LINE_WIDTH);
    assert_eq!(lines[4], "AAAAA");
}

#[test]
fn test_output_set_writes_all_files() {
    let dir = tempdir().unwrap();
    let registry = BiosequenceRegistry::from_reader(
        Cursor::new(
            "biosequence_set_id\tbiosequence_name\tbiosequence_accession\tgene_name\tdescription\n\
             1\tsp|P02768|ALBU_HUMAN\tP02768\tALB\tSerum albumin\n",
        ),
        Some("1"),
    )
    .unwrap();
    let searched: BTreeSet<ExperimentId> = [1, 2].into_iter().collect();

    let mut outputs = OutputSet::create(OutputPaths::new(dir.path(), "APD_all"), &searched, &registry).unwrap();
    outputs.write(&summary()).unwrap();
    assert_eq!(outputs.unresolved_biosequences(), 0);
    let paths = outputs.finish().unwrap();

    assert_eq!(paths.table, dir.path().join("APD_all.tsv"));
    let table = std::fs::read_to_string(&paths.table).unwrap();
    assert!(table.contains("\tALB\t"));
    let doc = std::fs::read_to_string(&paths.build_document).unwrap();
    assert!(doc.ends_with("</build>\n"));
    let fasta = std::fs::read_to_string(&paths.fasta).unwrap();
    assert_eq!(fasta, ">PAp00000001\nPEPTIDEK\n");
}
