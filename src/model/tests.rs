use super::*;
use proptest::prelude::*;

#[test]
fn test_residue_tag_follows_residue() {
    let mut mods = ModificationSet::new();
    mods.insert(2, 79.0);
    assert_eq!(mods.annotate("PEPTIDE"), "PE[79]PTIDE");

    let mut mods = ModificationSet::new();
    mods.insert(3, 79.0);
    assert_eq!(mods.annotate("PEPTIDE"), "PEP[79]TIDE");
}

#[test]
fn test_terminal_tags() {
    let mut mods = ModificationSet::new();
    mods.insert(0, 43.0);
    assert_eq!(mods.annotate("PEPTIDE"), "n[43]PEPTIDE");

    let mut mods = ModificationSet::new();
    mods.insert(8, 17.0);
    assert_eq!(mods.annotate("PEPTIDE"), "PEPTIDEc[17]");

    let mut mods = ModificationSet::new();
    mods.insert(0, 43.0);
    mods.insert(1, 96.0);
    mods.insert(8, 17.0);
    assert_eq!(mods.annotate("PEPTIDE"), "n[43]P[96]EPTIDEc[17]");
}

#[test]
fn test_mass_is_rounded() {
    let mut mods = ModificationSet::new();
    mods.insert(1, 147.0354);
    assert_eq!(mods.annotate("MK"), "M[147]K");
}

#[test]
fn test_unmodified_sequence_is_unchanged() {
    assert_eq!(ModificationSet::new().annotate("AAAGK"), "AAAGK");
}

#[test]
fn test_strip_modifications() {
    assert_eq!(strip_modifications("n[43]PE[79]PTIDEc[17]"), "PEPTIDE");
    assert_eq!(strip_modifications("M[147.04]K"), "MK");
    assert_eq!(strip_modifications("AAAGK"), "AAAGK");
}

#[test]
fn test_peptide_key() {
    assert_eq!(peptide_key(Some(2), "PE[79]PTIDE", "PEPTIDE"), "2-PE[79]PTIDE");
    assert_eq!(peptide_key(None, "PE[79]PTIDE", "PEPTIDE"), "PEPTIDE");
}

#[test]
fn test_lookup_prefers_unstripped_key() {
    let record = IdentificationRecord {
        stripped_sequence: "PEPTIDE".to_string(),
        modified_sequence: "PE[79]PTIDE".to_string(),
        charge: Some(2),
        ..Default::default()
    };

    let mut map = ProteinInferenceMap::new();
    map.insert(
        "PEPTIDE".to_string(),
        ProteinInferenceEntry {
            protein_name: "stripped".to_string(),
            ..Default::default()
        },
    );
    let (key, entry) = map.lookup(&record).unwrap();
    assert_eq!(key, "PEPTIDE");
    assert_eq!(entry.protein_name, "stripped");

    map.insert(
        "2-PE[79]PTIDE".to_string(),
        ProteinInferenceEntry {
            protein_name: "charged".to_string(),
            ..Default::default()
        },
    );
    let (key, entry) = map.lookup(&record).unwrap();
    assert_eq!(key, "2-PE[79]PTIDE");
    assert_eq!(entry.protein_name, "charged");
}

#[test]
fn test_insert_first_keeps_first_writer() {
    let mut map = ProteinInferenceMap::new();
    let first = ProteinInferenceEntry {
        protein_name: "first".to_string(),
        ..Default::default()
    };
    let second = ProteinInferenceEntry {
        protein_name: "second".to_string(),
        ..Default::default()
    };
    assert!(map.insert_first("2-AAAGK".to_string(), first));
    assert!(!map.insert_first("2-AAAGK".to_string(), second.clone()));
    assert_eq!(map.get("2-AAAGK").unwrap().protein_name, "first");

    let mut later = ProteinInferenceMap::new();
    later.insert("2-AAAGK".to_string(), second);
    map.absorb(later);
    assert_eq!(map.get("2-AAAGK").unwrap().protein_name, "second");
}

#[test]
fn test_unmatched_sentinel() {
    let record = IdentificationRecord::unmatched(3, "run.100.100.2".to_string(), Some(2));
    assert!(record.is_unmatched());
    assert_eq!(record.probability, Some(NO_MATCH_PROBABILITY));
}

proptest! {
    #[test]
    fn prop_strip_inverts_annotate(
        sequence in "[ACDEFGHIKLMNPQRSTVWY]{1,30}",
        raw_mods in proptest::collection::vec((0usize..32, 1.0f64..500.0), 0..5),
    ) {
        let mut mods = ModificationSet::new();
        let length = sequence.len();
        for (position, mass) in raw_mods {
            mods.insert(position.min(length + 1), mass);
        }
        prop_assert_eq!(strip_modifications(&mods.annotate(&sequence)), sequence);
    }
}
