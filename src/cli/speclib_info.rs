use anyhow::{Context, Result};
use std::path::PathBuf;

use pepatlas::speclib::SpectralLibrary;

pub fn run(file: PathBuf, keys: Vec<String>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let library = SpectralLibrary::from_file(&file)
        .with_context(|| format!("Failed to read spectral library {}", file.display()))?;
    let stats = library.stats();

    println!("Spectral Library: {}", file.display());
    println!("================");
    println!();
    println!("Records:              {}", stats.records);
    println!("Distinct peptide keys: {}", library.len());
    println!("Without probability:  {}", stats.without_probability);
    println!("Incomplete records:   {}", stats.incomplete);

    if !keys.is_empty() {
        println!();
        for key in &keys {
            match library.best_probability(key) {
                Some(p) => println!("{:<30} {:.4}", key, p),
                None => println!("{:<30} absent", key),
            }
        }
    }

    Ok(())
}
