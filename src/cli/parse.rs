use anyhow::{Context, Result};
use std::path::PathBuf;

use pepatlas::cache::{write_checkpoint, IdentificationCache};
use pepatlas::parser::{
    DocumentKind, DocumentReader, GroupingOptions, IdentificationOptions, ParsedDocument,
};
use pepatlas::registry::{AccessionSource, MemoryAccessionRegistry};

use super::KindArg;

pub fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    experiment_id: u32,
    probability_threshold: f64,
    kind: Option<KindArg>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let kind = kind
        .map(DocumentKind::from)
        .unwrap_or_else(|| DocumentKind::from_path(&input));
    println!("Parsing: {} ({:?} document)", input.display(), kind);

    let identification = IdentificationOptions::new(experiment_id, probability_threshold);
    let grouping = GroupingOptions::new(Some(experiment_id), probability_threshold);
    let mut registry = MemoryAccessionRegistry::default();
    let accessions: &mut dyn AccessionSource = &mut registry;
    let parsed = DocumentReader::open(&input)
        .and_then(|reader| reader.read(kind, &identification, &grouping, Some(accessions)))
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    match parsed {
        ParsedDocument::Identifications(records) => {
            let output = output.unwrap_or_else(|| {
                let dir = input.parent().map(PathBuf::from).unwrap_or_default();
                IdentificationCache::new(dir).checkpoint_path(experiment_id)
            });
            write_checkpoint(&output, &records)
                .with_context(|| format!("Failed to write checkpoint {}", output.display()))?;

            let unmatched = records.iter().filter(|r| r.is_unmatched()).count();
            println!();
            println!("Records written:    {}", records.len());
            println!("Without result:     {}", unmatched);
            println!("Accessions:         {}", registry.len());
            println!();
            println!("Checkpoint: {}", output.display());
        }
        ParsedDocument::ProteinInference(entries) => {
            if output.is_some() {
                anyhow::bail!("Grouping documents are summarised only; drop the OUTPUT argument");
            }
            println!();
            println!("Protein-inference entries: {}", entries.len());
        }
    }

    Ok(())
}
