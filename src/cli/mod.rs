use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use pepatlas::parser::DocumentKind;
use std::path::PathBuf;

mod build;
mod coalesce;
mod config;
mod parse;
mod speclib_info;

pub use config::Config;

/// pepatlas - Peptide-Level Build from Identification Documents
#[derive(Parser)]
#[command(name = "pepatlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Flags of the `build` command; each one overrides the config file
#[derive(clap::Args, Debug, Default)]
pub struct BuildArgs {
    /// Experiment list (experiment_id, identification document, optional
    /// grouping document and decoy-correction file, tab-delimited)
    #[arg(value_name = "EXPERIMENTS")]
    pub experiments: PathBuf,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for checkpoints, intermediate lists and outputs
    #[arg(short = 'w', long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// File-name prefix of the outputs
    #[arg(short = 'o', long, value_name = "PREFIX")]
    pub output_prefix: Option<String>,

    /// Minimum final probability of a record
    #[arg(short = 't', long, value_name = "P")]
    pub probability_threshold: Option<f64>,

    /// Take initial probabilities from the identification documents
    #[arg(long)]
    pub best_probs_from_identification: bool,

    /// Grouping document shared by every experiment
    #[arg(long, value_name = "FILE")]
    pub master_grouping_document: Option<PathBuf>,

    /// Spectral library used to demote peptides it lacks
    #[arg(long, value_name = "FILE")]
    pub spectral_library: Option<PathBuf>,

    /// Apply each experiment's decoy-correction scalar
    #[arg(long)]
    pub apply_decoy_correction: bool,

    /// Fail when an experiment has no checkpoint
    #[arg(long)]
    pub require_checkpoints: bool,

    /// Fail when an experiment's grouping document cannot be found
    #[arg(long)]
    pub require_grouping: bool,

    /// Persistent accession registry (accession, sequence per line)
    #[arg(long, value_name = "FILE")]
    pub accession_file: Option<PathBuf>,

    /// Biosequence attribute file
    #[arg(long, value_name = "FILE")]
    pub biosequence_file: Option<PathBuf>,

    /// Biosequence set to load from the attribute file
    #[arg(long, value_name = "NAME")]
    pub biosequence_set_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole build over an experiment list
    Build(BuildArgs),

    /// Parse one document; identification documents become a checkpoint file
    Parse {
        /// Identification (.pep.xml) or grouping (.prot.xml) document, optionally gzipped
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Checkpoint file to write (defaults to identlist_template_<id>.tsv)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Experiment id stamped on every record
        #[arg(short = 'e', long, default_value_t = 1)]
        experiment_id: u32,

        /// Minimum probability of a retained hit
        #[arg(short = 't', long, default_value_t = 0.9)]
        probability_threshold: f64,

        /// Document kind (guessed from the file name when omitted)
        #[arg(short = 'k', long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Summarise an already sorted corrected-record file
    Coalesce {
        /// Sorted corrected-record file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory
        #[arg(short = 'w', long, value_name = "DIR", default_value = ".")]
        work_dir: PathBuf,

        /// File-name prefix of the outputs
        #[arg(short = 'o', long, value_name = "PREFIX", default_value = "APD_all")]
        output_prefix: String,

        /// TOML config file (only `[registry] allowed_users` is used)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Display statistics of a spectral library
    SpeclibInfo {
        /// Spectral library file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the best probability of these keys (e.g. PEPTIDEK/2)
        #[arg(short = 'k', long = "key", value_name = "KEY")]
        keys: Vec<String>,
    },
}

/// Document kind accepted by `parse --kind`
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    /// Per-spectrum identification document
    Identification,
    /// Protein-inference grouping document
    Grouping,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Identification => DocumentKind::Identification,
            KindArg::Grouping => DocumentKind::Grouping,
        }
    }
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build(args) => build::run(args),
        Commands::Parse {
            input,
            output,
            experiment_id,
            probability_threshold,
            kind,
        } => parse::run(input, output, experiment_id, probability_threshold, kind),
        Commands::Coalesce {
            input,
            work_dir,
            output_prefix,
            config,
        } => coalesce::run(input, work_dir, output_prefix, config),
        Commands::SpeclibInfo { file, keys } => speclib_info::run(file, keys),
    }
}
