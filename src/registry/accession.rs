use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;

use super::{AccessionSource, RegistryError};

/// Textual shape of a peptide accession: a prefix followed by a zero-padded integer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessionFormat {
    /// Leading text, e.g. `PAp`
    pub prefix: String,
    /// Number of digits the integer part is padded to
    pub width: usize,
}

impl Default for AccessionFormat {
    fn default() -> Self {
        Self {
            prefix: "PAp".to_string(),
            width: 8,
        }
    }
}

impl AccessionFormat {
    /// Create a format with the given prefix and the default width
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Render an identifier
    pub fn format(&self, id: u64) -> String {
        format!("{}{:0width$}", self.prefix, id, width = self.width)
    }

    /// Recover the identifier from an accession of this format
    pub fn parse(&self, accession: &str) -> Option<u64> {
        accession.strip_prefix(self.prefix.as_str())?.parse().ok()
    }
}

/// Process-local registry, used when no persistent store is configured
#[derive(Debug, Default)]
pub struct MemoryAccessionRegistry {
    format: AccessionFormat,
    by_sequence: HashMap<String, String>,
    last_id: u64,
}

impl MemoryAccessionRegistry {
    /// Create an empty registry with the given format
    pub fn new(format: AccessionFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Number of registered sequences
    pub fn len(&self) -> usize {
        self.by_sequence.len()
    }

    /// True when nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.by_sequence.is_empty()
    }
}

impl AccessionSource for MemoryAccessionRegistry {
    fn accession_for(&mut self, sequence: &str) -> Result<String, RegistryError> {
        if let Some(accession) = self.by_sequence.get(sequence) {
            return Ok(accession.clone());
        }
        let id = next_identifier(self.last_id, sequence)?;
        let accession = self.format.format(id);
        self.last_id = id;
        self.by_sequence
            .insert(sequence.to_string(), accession.clone());
        Ok(accession)
    }
}

/// Registry persisted as a tab-delimited `accession<TAB>sequence` file.
///
/// Rows are only ever appended. Every read-then-allocate step runs under an
/// exclusive lock on a `<store>.lock` file next to the store, so two writers
/// never hand out the same identifier. Before allocating, the registry
/// re-reads any rows appended since its last read so that a sequence
/// registered by another writer is reused rather than allocated twice.
#[derive(Debug)]
pub struct FileAccessionRegistry {
    path: PathBuf,
    format: AccessionFormat,
    by_sequence: HashMap<String, String>,
    last_id: u64,
    /// Bytes of the store already consumed
    offset: u64,
    line: u64,
    loaded: bool,
}

impl FileAccessionRegistry {
    /// Create a registry over `path` without reading it yet
    pub fn new(path: impl Into<PathBuf>, format: AccessionFormat) -> Self {
        Self {
            path: path.into(),
            format,
            by_sequence: HashMap::new(),
            last_id: 0,
            offset: 0,
            line: 0,
            loaded: false,
        }
    }

    /// Create a registry over `path` and load the existing assignments
    pub fn open(path: impl Into<PathBuf>, format: AccessionFormat) -> Result<Self, RegistryError> {
        let mut registry = Self::new(path, format);
        registry.load()?;
        Ok(registry)
    }

    /// Path of the backing store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock file guarding the store
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Whether the store has been read at least once
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of known sequences
    pub fn len(&self) -> usize {
        self.by_sequence.len()
    }

    /// True when no sequence is known
    pub fn is_empty(&self) -> bool {
        self.by_sequence.is_empty()
    }

    /// Read the store (or the part of it appended since the last read)
    pub fn load(&mut self) -> Result<(), RegistryError> {
        let _lock = self.lock()?;
        self.refresh()?;
        self.loaded = true;
        Ok(())
    }

    /// Exclusive lock held until the returned file is dropped
    fn lock(&self) -> Result<File, RegistryError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        fs2::FileExt::lock_exclusive(&file)?;
        Ok(file)
    }

    /// Read rows appended since the last read. Call with the lock held.
    fn refresh(&mut self) -> Result<(), RegistryError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        file.seek(SeekFrom::Start(self.offset))?;
        let mut appended = String::new();
        file.read_to_string(&mut appended)?;

        let mut consumed = 0usize;
        for row in appended.split_inclusive('\n') {
            let text = row.trim_end_matches(['\n', '\r']);
            let parsed = if row.ends_with('\n') {
                self.parse_row(text)?
            } else {
                // An unterminated last row counts only when it reads as a whole row
                match self.parse_row(text) {
                    Ok(parsed) => parsed,
                    Err(_) => break,
                }
            };
            self.line += 1;
            consumed += row.len();

            if let Some((id, accession, sequence)) = parsed {
                self.last_id = self.last_id.max(id);
                self.by_sequence
                    .entry(sequence.to_string())
                    .or_insert_with(|| accession.to_string());
            }
        }
        self.offset += consumed as u64;
        Ok(())
    }

    /// `None` for blank and comment rows
    fn parse_row<'t>(&self, row: &'t str) -> Result<Option<(u64, &'t str, &'t str)>, RegistryError> {
        if row.is_empty() || row.starts_with('#') {
            return Ok(None);
        }
        let (accession, sequence) = row
            .split_once('\t')
            .filter(|(_, sequence)| !sequence.is_empty())
            .ok_or_else(|| self.malformed("expected two tab-separated columns"))?;
        let id = self
            .format
            .parse(accession)
            .filter(|id| *id > 0)
            .ok_or_else(|| self.malformed(&format!("'{}' is not a valid accession", accession)))?;
        Ok(Some((id, accession, sequence)))
    }

    fn malformed(&self, detail: &str) -> RegistryError {
        RegistryError::MalformedRow {
            path: self.path.display().to_string(),
            line: self.line + 1,
            detail: detail.to_string(),
        }
    }

    /// Append one row. Call with the lock held, right after `refresh`.
    fn append(&mut self, accession: &str, sequence: &str) -> Result<(), RegistryError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // Never glue a row onto an unterminated last line
        let length = file.metadata()?.len();
        let mut separator = "";
        if length > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(length - 1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                separator = "\n";
            }
        }
        writeln!(file, "{}{}\t{}", separator, accession, sequence)?;
        file.sync_data()?;

        self.offset = file.metadata()?.len();
        self.line += 1;
        Ok(())
    }
}

impl AccessionSource for FileAccessionRegistry {
    fn accession_for(&mut self, sequence: &str) -> Result<String, RegistryError> {
        if let Some(accession) = self.by_sequence.get(sequence) {
            return Ok(accession.clone());
        }

        let _lock = self.lock()?;
        self.refresh()?;
        self.loaded = true;
        if let Some(accession) = self.by_sequence.get(sequence) {
            return Ok(accession.clone());
        }

        let id = next_identifier(self.last_id, sequence)?;
        let accession = self.format.format(id);
        self.append(&accession, sequence)?;
        debug!("Registered {} as {}", sequence, accession);

        self.last_id = id;
        self.by_sequence
            .insert(sequence.to_string(), accession.clone());
        Ok(accession)
    }
}

fn next_identifier(last_id: u64, sequence: &str) -> Result<u64, RegistryError> {
    last_id
        .checked_add(1)
        .filter(|id| *id > 0)
        .ok_or_else(|| RegistryError::NonPositiveIdentifier {
            sequence: sequence.to_string(),
        })
}
