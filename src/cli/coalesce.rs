use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use pepatlas::auth::LocalAuthenticator;
use pepatlas::pipeline::{Pipeline, PipelineConfig};

use super::Config;

pub fn run(
    input: PathBuf,
    work_dir: PathBuf,
    output_prefix: String,
    config: Option<PathBuf>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let allowed_users = match &config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::from_file(path)?.registry.allowed_users
        }
        None => Vec::new(),
    };

    let pipeline_config = PipelineConfig {
        work_dir,
        output_prefix,
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(pipeline_config)
        .with_authenticator(Box::new(LocalAuthenticator::from_env(allowed_users)));
    let stats = pipeline
        .summarize(&input)
        .with_context(|| format!("Failed to summarise {}", input.display()))?;

    println!("Records:     {}", stats.sorted_records);
    println!("Peptides:    {}", stats.peptides);
    println!("Experiments: {}", stats.experiments);
    println!();
    let paths = pipeline.config().output_paths();
    println!("Outputs:");
    println!("  {}", paths.table.display());
    println!("  {}", paths.build_document.display());
    println!("  {}", paths.fasta.display());

    Ok(())
}
