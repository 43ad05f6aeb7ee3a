//! TOML configuration file support.
//!
//! Instead of passing many CLI flags, a build can be described in a config file:
//!
//! ```toml
//! # pepatlas.toml
//! [build]
//! probability_threshold = 0.9
//! work_dir = "build"
//! output_prefix = "APD_all"
//! master_grouping_document = "combined.prot.xml"
//! apply_decoy_correction = true
//!
//! [registry]
//! accession_file = "accessions.tsv"
//! accession_prefix = "PAp"
//! biosequence_file = "biosequences.tsv"
//! biosequence_set_id = "human_2024"
//! allowed_users = ["atlas_build"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use pepatlas::pipeline::PipelineConfig;

use super::BuildArgs;

/// Root configuration structure for pepatlas.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Registry and credential settings.
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Configuration for the build command.
#[derive(Debug, Default, Deserialize)]
pub struct BuildConfig {
    /// Minimum final probability of a record.
    pub probability_threshold: Option<f64>,

    /// Take initial probabilities from the identification documents.
    pub best_probs_from_identification: Option<bool>,

    /// Grouping document shared by every experiment.
    pub master_grouping_document: Option<PathBuf>,

    /// Spectral library used to demote peptides it lacks.
    pub spectral_library: Option<PathBuf>,

    /// Apply each experiment's decoy-correction scalar.
    pub apply_decoy_correction: Option<bool>,

    /// Fail when an experiment has no checkpoint.
    pub require_checkpoints: Option<bool>,

    /// Fail when an experiment's grouping document cannot be found.
    pub require_grouping: Option<bool>,

    /// Directory for checkpoints, intermediate lists and outputs.
    pub work_dir: Option<PathBuf>,

    /// File-name prefix of the outputs.
    pub output_prefix: Option<String>,
}

/// Accession, biosequence and credential settings.
#[derive(Debug, Default, Deserialize)]
pub struct RegistryConfig {
    /// Persistent accession registry.
    pub accession_file: Option<PathBuf>,

    /// Accession prefix (default `PAp`).
    pub accession_prefix: Option<String>,

    /// Biosequence attribute file.
    pub biosequence_file: Option<PathBuf>,

    /// Biosequence set to load.
    pub biosequence_set_id: Option<String>,

    /// Users allowed to run a build; empty allows everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Pipeline settings: command-line flags first, then the file, then defaults.
    pub fn pipeline_config(&self, args: &BuildArgs) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        let build = &self.build;
        PipelineConfig {
            probability_threshold: args
                .probability_threshold
                .or(build.probability_threshold)
                .unwrap_or(defaults.probability_threshold),
            best_probs_from_identification: args.best_probs_from_identification
                || build.best_probs_from_identification.unwrap_or(false),
            master_grouping_document: args
                .master_grouping_document
                .clone()
                .or_else(|| build.master_grouping_document.clone()),
            spectral_library: args
                .spectral_library
                .clone()
                .or_else(|| build.spectral_library.clone()),
            apply_decoy_correction: args.apply_decoy_correction
                || build.apply_decoy_correction.unwrap_or(false),
            require_checkpoints: args.require_checkpoints
                || build.require_checkpoints.unwrap_or(false),
            require_grouping: args.require_grouping || build.require_grouping.unwrap_or(false),
            work_dir: args
                .work_dir
                .clone()
                .or_else(|| build.work_dir.clone())
                .unwrap_or(defaults.work_dir),
            output_prefix: args
                .output_prefix
                .clone()
                .or_else(|| build.output_prefix.clone())
                .unwrap_or(defaults.output_prefix),
        }
    }

    /// Registry settings with command-line overrides applied.
    pub fn registry_config(&self, args: &BuildArgs) -> RegistryConfig {
        let registry = &self.registry;
        RegistryConfig {
            accession_file: args
                .accession_file
                .clone()
                .or_else(|| registry.accession_file.clone()),
            accession_prefix: registry.accession_prefix.clone(),
            biosequence_file: args
                .biosequence_file
                .clone()
                .or_else(|| registry.biosequence_file.clone()),
            biosequence_set_id: args
                .biosequence_set_id
                .clone()
                .or_else(|| registry.biosequence_set_id.clone()),
            allowed_users: registry.allowed_users.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [build]
            probability_threshold = 0.8
            work_dir = "build"
            master_grouping_document = "combined.prot.xml"
            apply_decoy_correction = true

            [registry]
            accession_file = "accessions.tsv"
            accession_prefix = "PAq"
            allowed_users = ["atlas_build"]
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.build.probability_threshold, Some(0.8));
        assert_eq!(config.build.work_dir, Some(PathBuf::from("build")));
        assert_eq!(
            config.build.master_grouping_document,
            Some(PathBuf::from("combined.prot.xml"))
        );
        assert_eq!(config.build.apply_decoy_correction, Some(true));
        assert!(config.build.output_prefix.is_none());
        assert_eq!(config.registry.accession_prefix.as_deref(), Some("PAq"));
        assert_eq!(config.registry.allowed_users, vec!["atlas_build".to_string()]);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert!(config.build.probability_threshold.is_none());
        assert!(config.registry.allowed_users.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str("[build]\nprobability_threshold = \"high\"").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let config = Config::from_str(
            r#"
            [build]
            probability_threshold = 0.8
            output_prefix = "from_file"
            require_grouping = true
            "#,
        )
        .unwrap();
        let args = BuildArgs {
            probability_threshold: Some(0.95),
            work_dir: Some(PathBuf::from("cli_dir")),
            ..Default::default()
        };

        let pipeline = config.pipeline_config(&args);
        assert_eq!(pipeline.probability_threshold, 0.95);
        assert_eq!(pipeline.work_dir, PathBuf::from("cli_dir"));
        assert_eq!(pipeline.output_prefix, "from_file");
        assert!(pipeline.require_grouping);
        assert!(!pipeline.require_checkpoints);
        assert!(pipeline.master_grouping_document.is_none());
    }

    #[test]
    fn test_defaults_without_file() {
        let pipeline = Config::default().pipeline_config(&BuildArgs::default());
        assert_eq!(pipeline.probability_threshold, 0.9);
        assert_eq!(pipeline.output_prefix, "APD_all");
        assert_eq!(pipeline.work_dir, PathBuf::from("."));
    }
}
