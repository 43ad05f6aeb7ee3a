//! # pepatlas - Peptide-Level Build from Identification Documents
//!
//! `pepatlas` consolidates per-spectrum peptide identifications (pepXML-like
//! identification documents) and per-protein inference results (protXML-like
//! grouping documents) from many experiments into one peptide-level dataset:
//! for every distinct peptide sequence, its best probability, best
//! protein-adjusted probability, observation counts and the experiments that
//! observed it.
//!
//! ## Key Features
//!
//! - **Streaming Document Parser**: event-driven quick-xml reader with explicit
//!   nesting validation; truncated or malformed documents fail loudly.
//!
//! - **Resumable Builds**: each experiment's parse result is checkpointed as a
//!   tab-delimited file and reused by later runs.
//!
//! - **Two-Pass Protein Adjustment**: a first pass collects the best
//!   spectrum-level probability per peptide across all experiments; the second
//!   pass rescales each record by its protein-level adjustment factor, with
//!   optional decoy correction and spectral-library filtering.
//!
//! - **Cross-Experiment Coalescing**: one summary per peptide, broken down by
//!   modified form and charge, counting protein-level evidence once per
//!   experiment.
//!
//! - **Stable Accessions**: peptide accessions (`PAp00000001`) persisted in a
//!   registry file so repeated builds agree.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pepatlas::pipeline::{read_experiment_list, Pipeline, PipelineConfig};
//!
//! let experiments = read_experiment_list(Path::new("experiments.tsv"))?;
//! let config = PipelineConfig {
//!     probability_threshold: 0.9,
//!     work_dir: "build".into(),
//!     ..Default::default()
//! };
//!
//! let stats = Pipeline::new(config).run(&experiments)?;
//! println!("{}", stats);
//! # Ok::<(), pepatlas::pipeline::PipelineError>(())
//! ```
//!
//! This writes into the work directory:
//! ```text
//! build/
//! ├── identlist_template_<id>.tsv   # per-experiment checkpoints
//! ├── identlist_<id>.tsv            # per-experiment corrected records
//! ├── identlist_sorted.tsv          # all corrected records, sorted
//! ├── APD_all.tsv                   # flat peptide summary table
//! ├── APD_all.PAxml                 # nested build document
//! ├── APD_all.fasta                 # peptide sequences
//! └── APD_all.summary.json          # run statistics
//! ```
//!
//! ## Parsing a Single Document
//!
//! ```rust,no_run
//! use pepatlas::parser::{parse_identification_file, IdentificationOptions};
//!
//! let options = IdentificationOptions::new(1, 0.9);
//! let (records, stats) = parse_identification_file("interact.pep.xml", &options, None)?;
//! println!("{} of {} spectra kept", stats.retained, stats.spectra);
//! # Ok::<(), pepatlas::parser::ParseError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`model`]: identification records, protein-inference entries, peptide keys
//! - [`parser`]: streaming identification and grouping document parser
//! - [`cache`]: checkpoint and corrected-record files
//! - [`index`]: first-pass best-probability index
//! - [`merge`]: protein-adjustment merger
//! - [`speclib`]: spectral library lookup
//! - [`registry`]: peptide accession and biosequence registries
//! - [`coalesce`]: cross-experiment peptide summaries
//! - [`output`]: summary table, build document and FASTA writers
//! - [`pipeline`]: experiment list and build orchestration
//! - [`auth`]: credential check

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod cache;
pub mod coalesce;
pub mod index;
pub mod merge;
pub mod model;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod speclib;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::auth::{AuthError, Authenticator, Identity, LocalAuthenticator, Role};
    pub use crate::cache::{CacheError, CorrectedRecordWriter, IdentificationCache, RecordReader};
    pub use crate::coalesce::{coalesce, Coalescer, CoalesceError, ModifiedInstance, PeptideSummary};
    pub use crate::index::InitialProbabilityIndex;
    pub use crate::merge::{
        InferenceScope, MergeOptions, MergeOutcome, MergeStats, ProteinAdjustmentMerger,
    };
    pub use crate::model::{
        peptide_key, strip_modifications, ExperimentId, IdentificationRecord, ModificationSet,
        ProteinAdjustment, ProteinInferenceEntry, ProteinInferenceMap,
    };
    pub use crate::output::{
        BuildDocumentWriter, OutputError, OutputPaths, OutputSet, PeptideFastaWriter,
        SummaryTableWriter,
    };
    pub use crate::parser::{
        parse_grouping_file, parse_identification_file, DocumentKind, DocumentReader,
        GroupingOptions, IdentificationOptions, ParseError, ParsedDocument,
    };
    pub use crate::pipeline::{
        read_experiment_list, BuildStats, Experiment, Pipeline, PipelineConfig, PipelineError,
    };
    pub use crate::registry::{
        AccessionFormat, AccessionSource, BiosequenceAttributes, BiosequenceRegistry,
        FileAccessionRegistry, MemoryAccessionRegistry, RegistryError,
    };
    pub use crate::speclib::{LibraryError, SpectralLibrary};
}
