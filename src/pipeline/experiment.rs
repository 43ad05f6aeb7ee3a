use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::debug;

use super::PipelineError;
use crate::model::ExperimentId;

/// Grouping-document names tried next to the identification document when
/// an experiment does not list one
pub const GROUPING_FALLBACK_NAMES: [&str; 2] = ["interact-prob.prot.xml", "interact.prot.xml"];

/// One input experiment (search batch) of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    /// Experiment identifier
    pub id: ExperimentId,
    /// Identification document
    pub identification_document: PathBuf,
    /// Grouping document, when listed explicitly
    pub grouping_document: Option<PathBuf>,
    /// File holding the experiment's decoy-correction scalar
    pub decoy_correction_file: Option<PathBuf>,
}

impl Experiment {
    /// Experiment with only an identification document
    pub fn new(id: ExperimentId, identification_document: impl Into<PathBuf>) -> Self {
        Self {
            id,
            identification_document: identification_document.into(),
            grouping_document: None,
            decoy_correction_file: None,
        }
    }

    /// Set the grouping document
    pub fn with_grouping_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.grouping_document = Some(path.into());
        self
    }

    /// Set the decoy-correction file
    pub fn with_decoy_correction_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.decoy_correction_file = Some(path.into());
        self
    }

    /// Grouping documents to try, in order
    pub fn grouping_candidates(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.grouping_document {
            return vec![path.clone()];
        }

        let dir = self
            .identification_document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut candidates = Vec::new();
        if let Some(stem) = document_stem(&self.identification_document) {
            candidates.push(dir.join(format!("{}.prot.xml", stem)));
        }
        for name in GROUPING_FALLBACK_NAMES {
            let candidate = dir.join(name);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        candidates
    }

    /// First grouping candidate that exists on disk
    pub fn resolve_grouping_document(&self) -> Option<PathBuf> {
        self.grouping_candidates()
            .into_iter()
            .find(|path| path.is_file())
    }
}

/// File name with the compression and document-kind suffixes removed
fn document_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let lower = name.to_ascii_lowercase();
    let stem_len = [".pep.xml", ".pepxml", ".xml"]
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| name.len() - suffix.len())
        .unwrap_or(name.len());
    let stem = &name[..stem_len];
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Read a tab-delimited experiment list.
///
/// Each line is `experiment_id  identification_document  [grouping_document
/// [decoy_correction_file]]`; `#` starts a comment line. Relative paths are
/// resolved against the list's directory.
pub fn read_experiment_list(path: &Path) -> Result<Vec<Experiment>, PipelineError> {
    let file = File::open(path)?;
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    read_experiment_list_from(BufReader::new(file), path, &base)
}

/// Read an experiment list from any source; `path` is used in error messages
pub fn read_experiment_list_from<R: Read>(
    reader: R,
    path: &Path,
    base: &Path,
) -> Result<Vec<Experiment>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let list_error = |line: usize, detail: String| PipelineError::ExperimentList {
        path: path.to_path_buf(),
        line,
        detail,
    };

    let mut experiments = Vec::new();
    let mut seen = HashSet::new();
    for row in csv_reader.records() {
        let row = row.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
            list_error(line, e.to_string())
        })?;
        let line = row.position().map(|p| p.line() as usize).unwrap_or(0);
        let fields: Vec<&str> = row.iter().map(str::trim).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        if fields.len() < 2 || fields[1].is_empty() {
            return Err(list_error(
                line,
                "expected an experiment id and an identification document".to_string(),
            ));
        }

        let id: ExperimentId = fields[0]
            .parse()
            .map_err(|_| list_error(line, format!("invalid experiment id '{}'", fields[0])))?;
        if !seen.insert(id) {
            return Err(list_error(line, format!("experiment {} listed twice", id)));
        }

        let resolve = |raw: &str| -> Option<PathBuf> {
            if raw.is_empty() {
                None
            } else {
                Some(base.join(raw))
            }
        };
        experiments.push(Experiment {
            id,
            identification_document: base.join(fields[1]),
            grouping_document: fields.get(2).and_then(|f| resolve(f)),
            decoy_correction_file: fields.get(3).and_then(|f| resolve(f)),
        });
    }
    Ok(experiments)
}

/// Read the decoy-correction scalar of an experiment.
///
/// A missing file yields `None`; an existing file without a numeric token
/// is an error.
pub fn read_decoy_correction(path: &Path) -> Result<Option<f64>, PipelineError> {
    if !path.is_file() {
        debug!("No decoy correction file at {}", path.display());
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .find_map(|token| token.parse::<f64>().ok())
        .map(Some)
        .ok_or_else(|| PipelineError::InvalidDecoyCorrection(path.to_path_buf()))
}
