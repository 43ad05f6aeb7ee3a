use anyhow::{Context, Result};
use log::info;

use pepatlas::auth::LocalAuthenticator;
use pepatlas::pipeline::{read_experiment_list, Pipeline};
use pepatlas::registry::{AccessionFormat, BiosequenceRegistry, FileAccessionRegistry};

use super::{BuildArgs, Config};

pub fn run(args: BuildArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    let pipeline_config = config.pipeline_config(&args);
    let registry = config.registry_config(&args);

    let experiments = read_experiment_list(&args.experiments)
        .with_context(|| format!("Failed to read experiment list {}", args.experiments.display()))?;
    if experiments.is_empty() {
        anyhow::bail!("Experiment list {} is empty", args.experiments.display());
    }

    println!("pepatlas build");
    println!("==============");
    println!("Experiments:  {}", experiments.len());
    println!("Work dir:     {}", pipeline_config.work_dir.display());
    println!("Threshold:    {}", pipeline_config.probability_threshold);
    if let Some(master) = &pipeline_config.master_grouping_document {
        println!("Grouping:     {} (shared)", master.display());
    }
    println!();

    let authenticator = LocalAuthenticator::from_env(registry.allowed_users.clone());
    let mut pipeline = Pipeline::new(pipeline_config).with_authenticator(Box::new(authenticator));

    if let Some(path) = &registry.accession_file {
        let format = registry
            .accession_prefix
            .clone()
            .map(AccessionFormat::with_prefix)
            .unwrap_or_default();
        let accessions = FileAccessionRegistry::open(path, format)
            .with_context(|| format!("Failed to open accession registry {}", path.display()))?;
        info!("Loaded {} accessions from {}", accessions.len(), path.display());
        pipeline = pipeline.with_accessions(Box::new(accessions));
    }

    if let Some(path) = &registry.biosequence_file {
        let biosequences =
            BiosequenceRegistry::from_file(path, registry.biosequence_set_id.as_deref())
                .with_context(|| format!("Failed to load biosequences from {}", path.display()))?;
        info!(
            "Loaded {} biosequences from {} (set {})",
            biosequences.len(),
            path.display(),
            biosequences.set_id().unwrap_or("any")
        );
        pipeline = pipeline.with_biosequences(biosequences);
    }

    let stats = pipeline.run(&experiments).context("Build failed")?;

    println!("{}", stats);
    let paths = pipeline.config().output_paths();
    println!("Outputs:");
    println!("  {}", paths.table.display());
    println!("  {}", paths.build_document.display());
    println!("  {}", paths.fasta.display());
    println!("  {}", pipeline.config().summary_path().display());
    if stats.warnings > 0 {
        println!();
        println!("{} warnings (run with -v for details)", stats.warnings);
    }

    Ok(())
}
