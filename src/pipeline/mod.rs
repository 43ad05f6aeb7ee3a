//! # Build Pipeline
//!
//! Sequential, single-threaded orchestration of a build:
//!
//! 1. **Credential check**: one call to the [`Authenticator`]; failure aborts
//!    before any file is written.
//! 2. **Pass 1**: each experiment's identification document is parsed into a
//!    checkpoint (or an existing checkpoint is reused as-is). When
//!    `best_probs_from_identification` is set, every record also feeds the
//!    [`InitialProbabilityIndex`].
//! 3. **Pass 2**: for each experiment the applicable protein-inference
//!    entries are loaded, the checkpoint is merged through the
//!    [`ProteinAdjustmentMerger`] and written as `identlist_<id>.tsv`.
//! 4. **Sort**: the corrected files are merged into `identlist_sorted.tsv` by
//!    a [`RecordSorter`].
//! 5. **Coalesce and write**: one [`PeptideSummary`] per peptide sequence,
//!    written to every output of an [`OutputSet`].
//!
//! Pass 2 never starts before pass 1 has finished for every experiment: the
//! index must hold the maximum over the whole build.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pepatlas::pipeline::{Pipeline, PipelineConfig, read_experiment_list};
//!
//! let experiments = read_experiment_list(Path::new("experiments.tsv"))?;
//! let config = PipelineConfig {
//!     work_dir: "build".into(),
//!     ..Default::default()
//! };
//! let stats = Pipeline::new(config).run(&experiments)?;
//! println!("{}", stats);
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};

use crate::auth::{Authenticator, LocalAuthenticator, Role};
use crate::cache::{CacheError, CorrectedRecordWriter, IdentificationCache, RecordReader};
use crate::coalesce::{Coalescer, PeptideSummary};
use crate::index::InitialProbabilityIndex;
use crate::merge::{InferenceScope, MergeOptions, ProteinAdjustmentMerger};
use crate::model::{ExperimentId, IdentificationRecord, ProteinInferenceMap};
use crate::output::{OutputPaths, OutputSet};
use crate::parser::{parse_grouping_file, parse_identification_file, GroupingOptions, IdentificationOptions};
use crate::registry::{AccessionSource, BiosequenceRegistry, MemoryAccessionRegistry};
use crate::speclib::SpectralLibrary;

pub use error::PipelineError;
pub use experiment::{
    read_decoy_correction, read_experiment_list, read_experiment_list_from, Experiment,
    GROUPING_FALLBACK_NAMES,
};
pub use sort::{record_order, InMemorySorter, RecordSorter};
pub use stats::BuildStats;

mod error;
mod experiment;
mod sort;
mod stats;


/// Name of the merged, sorted corrected-record file in the work directory
pub const SORTED_LIST_NAME: &str = "identlist_sorted.tsv";

/// Settings of one build
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum final probability of a record
    pub probability_threshold: f64,
    /// Take initial probabilities from the identification documents (index)
    /// rather than from the grouping documents
    pub best_probs_from_identification: bool,
    /// Grouping document shared by every experiment
    pub master_grouping_document: Option<PathBuf>,
    /// Spectral library used to demote peptides it lacks (master mode only)
    pub spectral_library: Option<PathBuf>,
    /// Apply each experiment's decoy-correction scalar
    pub apply_decoy_correction: bool,
    /// Fail when an experiment has no checkpoint instead of parsing
    pub require_checkpoints: bool,
    /// Fail when an experiment's grouping document cannot be found
    pub require_grouping: bool,
    /// Directory for checkpoints, intermediate lists and outputs
    pub work_dir: PathBuf,
    /// File-name prefix of the outputs
    pub output_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            probability_threshold: 0.9,
            best_probs_from_identification: false,
            master_grouping_document: None,
            spectral_library: None,
            apply_decoy_correction: false,
            require_checkpoints: false,
            require_grouping: false,
            work_dir: PathBuf::from("."),
            output_prefix: "APD_all".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Per-experiment or master grouping
    pub fn inference_scope(&self) -> InferenceScope {
        if self.master_grouping_document.is_some() {
            InferenceScope::Master
        } else {
            InferenceScope::PerExperiment
        }
    }

    /// Output file locations
    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths::new(&self.work_dir, &self.output_prefix)
    }

    /// Location of the run summary
    pub fn summary_path(&self) -> PathBuf {
        self.work_dir
            .join(format!("{}.summary.json", self.output_prefix))
    }
}

/// A configured build with its injected collaborators
pub struct Pipeline {
    config: PipelineConfig,
    accessions: Box<dyn AccessionSource>,
    biosequences: BiosequenceRegistry,
    authenticator: Box<dyn Authenticator>,
    sorter: Box<dyn RecordSorter>,
}

impl Pipeline {
    /// Pipeline with an in-memory accession registry, no biosequence
    /// attributes, the local credential check and the in-memory sorter
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            accessions: Box::new(MemoryAccessionRegistry::default()),
            biosequences: BiosequenceRegistry::empty(),
            authenticator: Box::new(LocalAuthenticator::from_env(Vec::new())),
            sorter: Box::new(InMemorySorter),
        }
    }

    /// Use a different accession registry
    pub fn with_accessions(mut self, accessions: Box<dyn AccessionSource>) -> Self {
        self.accessions = accessions;
        self
    }

    /// Use a loaded biosequence registry
    pub fn with_biosequences(mut self, biosequences: BiosequenceRegistry) -> Self {
        self.biosequences = biosequences;
        self
    }

    /// Use a different credential check
    pub fn with_authenticator(mut self, authenticator: Box<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Use a different sorter
    pub fn with_sorter(mut self, sorter: Box<dyn RecordSorter>) -> Self {
        self.sorter = sorter;
        self
    }

    /// Configuration of the build
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole build
    pub fn run(&mut self, experiments: &[Experiment]) -> Result<BuildStats, PipelineError> {
        let mut stats = BuildStats {
            experiments: experiments.len(),
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        let identity = self.authenticator.authenticate(Role::Builder)?;
        info!("Authenticated as {}", identity.username);

        std::fs::create_dir_all(&self.config.work_dir)?;
        let cache = IdentificationCache::new(&self.config.work_dir);

        let index = self.first_pass(experiments, &cache, &mut stats)?;
        let corrected = self.second_pass(experiments, &cache, index.as_ref(), &mut stats)?;

        let sorted = self.config.work_dir.join(SORTED_LIST_NAME);
        stats.sorted_records = self.sorter.sort(&corrected, &sorted)?;

        let searched: BTreeSet<_> = experiments.iter().map(|e| e.id).collect();
        let paths = self.coalesce_and_write(&sorted, &searched, &mut stats)?;

        stats.finished_at = Some(Utc::now());
        stats.write_json(&self.config.summary_path())?;
        info!("{}", stats);
        info!(
            "Wrote {}, {} and {}",
            paths.table.display(),
            paths.build_document.display(),
            paths.fasta.display()
        );
        Ok(stats)
    }

    /// Summarise an already sorted corrected-record file into the outputs.
    ///
    /// The searched experiments are those the file mentions. The credential
    /// check runs before any output is created.
    pub fn summarize(&mut self, sorted: &Path) -> Result<BuildStats, PipelineError> {
        let identity = self.authenticator.authenticate(Role::Builder)?;
        info!("Authenticated as {}", identity.username);

        let cache_error = |source: CacheError| PipelineError::Cache {
            path: sorted.to_path_buf(),
            source,
        };
        let mut searched = BTreeSet::new();
        let mut records = 0usize;
        for record in RecordReader::open(sorted).map_err(cache_error)? {
            searched.insert(record.map_err(cache_error)?.experiment_id);
            records += 1;
        }

        let mut stats = BuildStats {
            experiments: searched.len(),
            sorted_records: records,
            started_at: Some(Utc::now()),
            ..Default::default()
        };
        std::fs::create_dir_all(&self.config.work_dir)?;
        self.coalesce_and_write(sorted, &searched, &mut stats)?;
        stats.finished_at = Some(Utc::now());
        info!("{}", stats);
        Ok(stats)
    }

    /// Parse or reload every checkpoint; build the index when requested
    fn first_pass(
        &mut self,
        experiments: &[Experiment],
        cache: &IdentificationCache,
        stats: &mut BuildStats,
    ) -> Result<Option<InitialProbabilityIndex>, PipelineError> {
        let mut index = self
            .config
            .best_probs_from_identification
            .then(InitialProbabilityIndex::new);

        for experiment in experiments {
            let records = self.load_or_parse(experiment, cache, stats)?;
            stats.checkpoint_records += records.len();
            if let Some(index) = index.as_mut() {
                index.extend(&records);
            }
        }

        if let Some(index) = &index {
            stats.index_keys = index.len();
            info!("Initial-probability index holds {} peptide keys", index.len());
        }
        Ok(index)
    }

    fn load_or_parse(
        &mut self,
        experiment: &Experiment,
        cache: &IdentificationCache,
        stats: &mut BuildStats,
    ) -> Result<Vec<IdentificationRecord>, PipelineError> {
        let checkpoint = cache.checkpoint_path(experiment.id);
        let cached = cache.load(experiment.id).map_err(|source| PipelineError::Cache {
            path: checkpoint.clone(),
            source,
        })?;
        if let Some(records) = cached {
            info!(
                "Experiment {}: reusing checkpoint {} ({} records)",
                experiment.id,
                checkpoint.display(),
                records.len()
            );
            stats.checkpoints_reused += 1;
            return Ok(records);
        }
        if self.config.require_checkpoints {
            return Err(PipelineError::MissingRequiredFile(checkpoint));
        }

        let document = &experiment.identification_document;
        info!("Experiment {}: parsing {}", experiment.id, document.display());
        let options = IdentificationOptions::new(experiment.id, self.config.probability_threshold);
        let accessions: &mut dyn AccessionSource = self.accessions.as_mut();
        let (records, parse_stats) =
            parse_identification_file(document, &options, Some(accessions))
                .map_err(|source| PipelineError::Parse {
                    path: document.clone(),
                    source,
                })?;

        stats.documents_parsed += 1;
        stats.spectra += parse_stats.spectra;
        stats.unmatched_spectra += parse_stats.unmatched;
        debug!("Experiment {}: {:?}", experiment.id, parse_stats);

        cache
            .store(experiment.id, &records)
            .map_err(|source| PipelineError::Cache {
                path: checkpoint,
                source,
            })?;
        Ok(records)
    }

    /// Merge protein adjustments into every checkpoint
    fn second_pass(
        &self,
        experiments: &[Experiment],
        cache: &IdentificationCache,
        index: Option<&InitialProbabilityIndex>,
        stats: &mut BuildStats,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let scope = self.config.inference_scope();
        let master = self.load_master_grouping(stats)?;
        let library = match scope {
            InferenceScope::Master => self.load_library(stats)?,
            InferenceScope::PerExperiment => None,
        };

        let mut corrected = Vec::with_capacity(experiments.len());
        for experiment in experiments {
            let per_experiment;
            let inference = match &master {
                Some(master) => master,
                None => {
                    per_experiment = self.load_experiment_grouping(experiment, stats)?;
                    &per_experiment
                }
            };

            let decoy_correction = self.decoy_correction(experiment)?;
            if decoy_correction.is_some() {
                stats.decoy_corrections += 1;
            }

            let checkpoint = cache.checkpoint_path(experiment.id);
            let records = cache
                .load(experiment.id)
                .map_err(|source| PipelineError::Cache {
                    path: checkpoint.clone(),
                    source,
                })?
                .ok_or(PipelineError::MissingRequiredFile(checkpoint))?;

            let merger = ProteinAdjustmentMerger::new(
                inference,
                MergeOptions {
                    probability_threshold: self.config.probability_threshold,
                    scope,
                    index,
                    library: library.as_ref(),
                    decoy_correction,
                },
            );
            let outcome = merger.merge(records);
            stats.merge.accumulate(&outcome.stats);
            stats.warnings += outcome.stats.warnings();

            let path = cache.corrected_path(experiment.id);
            write_corrected(&path, &outcome.records)?;
            info!(
                "Experiment {}: {} of {} records written to {}",
                experiment.id,
                outcome.stats.retained,
                outcome.stats.records,
                path.display()
            );
            corrected.push(path);
        }
        Ok(corrected)
    }

    fn load_master_grouping(
        &self,
        stats: &mut BuildStats,
    ) -> Result<Option<ProteinInferenceMap>, PipelineError> {
        let path = match &self.config.master_grouping_document {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.is_file() {
            return Err(PipelineError::MissingRequiredFile(path.clone()));
        }
        let options = GroupingOptions::new(None, self.config.probability_threshold);
        self.parse_grouping(path, options, stats).map(Some)
    }

    fn load_experiment_grouping(
        &self,
        experiment: &Experiment,
        stats: &mut BuildStats,
    ) -> Result<ProteinInferenceMap, PipelineError> {
        match experiment.resolve_grouping_document() {
            Some(path) => self.parse_grouping(
                &path,
                GroupingOptions::new(Some(experiment.id), self.config.probability_threshold),
                stats,
            ),
            None => {
                let candidates = experiment.grouping_candidates();
                if self.config.require_grouping {
                    let first = candidates
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| experiment.identification_document.clone());
                    return Err(PipelineError::MissingRequiredFile(first));
                }
                warn!(
                    "Experiment {}: no grouping document found (tried {}); records keep their probabilities",
                    experiment.id,
                    candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                stats.missing_grouping_documents += 1;
                stats.warnings += 1;
                Ok(ProteinInferenceMap::new())
            }
        }
    }

    fn parse_grouping(
        &self,
        path: &Path,
        options: GroupingOptions,
        stats: &mut BuildStats,
    ) -> Result<ProteinInferenceMap, PipelineError> {
        info!("Reading grouping document {}", path.display());
        let (entries, grouping_stats) =
            parse_grouping_file(path, &options).map_err(|source| PipelineError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("{}: {:?}", path.display(), grouping_stats);
        stats.grouping_documents += 1;
        stats.grouping_entries += entries.len();
        Ok(entries)
    }

    fn load_library(&self, stats: &mut BuildStats) -> Result<Option<SpectralLibrary>, PipelineError> {
        let path = match &self.config.spectral_library {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.is_file() {
            warn!(
                "Spectral library {} not found; library filtering skipped",
                path.display()
            );
            stats.warnings += 1;
            return Ok(None);
        }
        let library = SpectralLibrary::from_file(path).map_err(|source| PipelineError::Library {
            path: path.clone(),
            source,
        })?;
        info!("Loaded {} peptide keys from {}", library.len(), path.display());
        Ok(Some(library))
    }

    fn decoy_correction(&self, experiment: &Experiment) -> Result<Option<f64>, PipelineError> {
        if !self.config.apply_decoy_correction {
            return Ok(None);
        }
        match &experiment.decoy_correction_file {
            Some(path) => read_decoy_correction(path),
            None => Ok(None),
        }
    }

    /// Coalesce the sorted list and feed every summary to the outputs
    fn coalesce_and_write(
        &mut self,
        sorted: &Path,
        searched: &BTreeSet<ExperimentId>,
        stats: &mut BuildStats,
    ) -> Result<OutputPaths, PipelineError> {
        let cache_error = |source: CacheError| PipelineError::Cache {
            path: sorted.to_path_buf(),
            source,
        };
        let reader = RecordReader::open(sorted).map_err(cache_error)?;
        let mut outputs = OutputSet::create(self.config.output_paths(), searched, &self.biosequences)?;
        let mut coalescer = Coalescer::new();

        for record in reader {
            let record = record.map_err(cache_error)?;
            if let Some(summary) = coalescer.push(record)? {
                write_summary(self.accessions.as_mut(), &mut outputs, summary, stats)?;
            }
        }
        if let Some(summary) = coalescer.finish() {
            write_summary(self.accessions.as_mut(), &mut outputs, summary, stats)?;
        }

        stats.unresolved_biosequences = outputs.unresolved_biosequences();
        Ok(outputs.finish()?)
    }
}

fn write_summary(
    accessions: &mut dyn AccessionSource,
    outputs: &mut OutputSet<'_>,
    mut summary: PeptideSummary,
    stats: &mut BuildStats,
) -> Result<(), PipelineError> {
    if summary.peptide_accession.is_none() {
        summary.peptide_accession = Some(accessions.accession_for(&summary.peptide_sequence)?);
        stats.accessions_assigned += 1;
    }
    outputs.write(&summary)?;
    stats.peptides += 1;
    Ok(())
}

fn write_corrected(path: &Path, records: &[IdentificationRecord]) -> Result<(), PipelineError> {
    let cache_error = |source: CacheError| PipelineError::Cache {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = CorrectedRecordWriter::create(path).map_err(cache_error)?;
    for record in records {
        writer.write_record(record).map_err(cache_error)?;
    }
    debug!("{}: {} rows", path.display(), writer.rows());
    writer.finish().map_err(cache_error)?;
    Ok(())
}
