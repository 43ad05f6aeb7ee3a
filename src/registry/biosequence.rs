use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;

use super::RegistryError;

/// Gene name and description of one biosequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiosequenceAttributes {
    /// Database accession of the biosequence
    pub accession: String,
    /// Gene name, possibly empty
    pub gene_name: String,
    /// Free-text description, possibly empty
    pub description: String,
}

/// Read-only attribute lookup scoped to one biosequence set.
///
/// Loaded in bulk from a tab-delimited file with the header
/// `biosequence_set_id  biosequence_name  biosequence_accession  gene_name  description`.
#[derive(Debug, Default)]
pub struct BiosequenceRegistry {
    set_id: Option<String>,
    by_name: HashMap<String, BiosequenceAttributes>,
    loaded: bool,
}

impl BiosequenceRegistry {
    /// Registry that has not been loaded; every lookup resolves to nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the rows of `set_id` (every row when `None`) from a file
    pub fn from_file<P: AsRef<Path>>(path: P, set_id: Option<&str>) -> Result<Self, RegistryError> {
        let file = File::open(path.as_ref())?;
        let registry = Self::from_reader(BufReader::new(file), set_id)?;
        info!(
            "Loaded {} biosequences from {}",
            registry.len(),
            path.as_ref().display()
        );
        Ok(registry)
    }

    /// Load the rows of `set_id` (every row when `None`) from a reader
    pub fn from_reader<R: Read>(reader: R, set_id: Option<&str>) -> Result<Self, RegistryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .has_headers(true)
            .quoting(false)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();
        let column = |name: &str| -> Result<usize, RegistryError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| RegistryError::MissingColumn(name.to_string()))
        };
        let set_column = column("biosequence_set_id")?;
        let name_column = column("biosequence_name")?;
        let accession_column = headers.iter().position(|h| h == "biosequence_accession");
        let gene_column = headers.iter().position(|h| h == "gene_name");
        let description_column = headers.iter().position(|h| h == "description");

        let mut by_name = HashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let field = |i: Option<usize>| {
                i.and_then(|i| record.get(i))
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            };
            if let Some(wanted) = set_id {
                if record.get(set_column).map(str::trim) != Some(wanted) {
                    continue;
                }
            }
            let name = field(Some(name_column));
            if name.is_empty() {
                continue;
            }
            by_name.insert(
                name,
                BiosequenceAttributes {
                    accession: field(accession_column),
                    gene_name: field(gene_column),
                    description: field(description_column),
                },
            );
        }

        Ok(Self {
            set_id: set_id.map(str::to_string),
            by_name,
            loaded: true,
        })
    }

    /// Whether the registry has been populated from a source
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Biosequence set the registry is scoped to
    pub fn set_id(&self) -> Option<&str> {
        self.set_id.as_deref()
    }

    /// Number of biosequences
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when no biosequence is known
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Attributes for a protein name
    pub fn attributes_for(&self, protein_name: &str) -> Option<&BiosequenceAttributes> {
        self.by_name.get(protein_name)
    }
}
