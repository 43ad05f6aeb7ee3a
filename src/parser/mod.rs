//! # Document Parser
//!
//! Streaming, event-driven reader for the two hierarchical documents the build
//! consumes:
//!
//! - **identification documents** (per-spectrum search results, pepXML-like),
//!   decoded into a list of [`IdentificationRecord`];
//! - **grouping documents** (per-protein inference, protXML-like), decoded into
//!   a [`ProteinInferenceMap`].
//!
//! ## Event model
//!
//! [`DocumentReader`] pulls events from quick-xml and turns them into two
//! callbacks on an [`ElementHandler`]: `element_open(name, attributes)` and
//! `element_close(name)`, fired in document order. Self-closing elements
//! produce an open immediately followed by a close.
//!
//! Nesting is validated with an explicit [`ElementStack`]: every close must
//! match the innermost open element, and the document must end with the stack
//! empty. Any violation is a fatal [`ParseError::DocumentStructure`].
//!
//! ```text
//! msms_pipeline_analysis
//! └── msms_run_summary
//!     └── spectrum_query*                  (spectrum, assumed_charge)
//!         └── search_result                (at most one)
//!             └── search_hit               (peptide, protein, massdiff, ...)
//!                 ├── modification_info    (mod_nterm_mass, mod_cterm_mass)
//!                 │   └── mod_aminoacid_mass*  (position, mass)
//!                 ├── search_score*        (name="probability")
//!                 └── analysis_result
//!                     ├── peptideprophet_result  (probability)
//!                     └── interprophet_result    (probability, supersedes)
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::model::{IdentificationRecord, ProteinInferenceMap};
use crate::registry::AccessionSource;

pub use error::ParseError;
pub use grouping::{GroupingOptions, GroupingStats, GROUPING_RETENTION_MARGIN};
pub use helpers::Attributes;
pub use identification::{IdentificationOptions, IdentificationStats, PARSE_PROBABILITY_CUTOFF};
pub use stack::ElementStack;

mod error;
mod grouping;
mod helpers;
mod identification;
mod stack;


/// Default input buffer size for document parsing (64KB)
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 64 * 1024;

/// The closed set of document kinds the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Per-spectrum search-result document
    Identification,
    /// Per-protein inference document
    Grouping,
}

impl DocumentKind {
    /// Guess the kind from a file name: `*.prot.xml` (optionally gzipped)
    /// is a grouping document, anything else an identification document
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        if name.ends_with(".prot.xml") || name.ends_with(".protxml") {
            DocumentKind::Grouping
        } else {
            DocumentKind::Identification
        }
    }
}

/// Result of parsing a document of either kind
#[derive(Debug)]
pub enum ParsedDocument {
    /// Records from an identification document
    Identifications(Vec<IdentificationRecord>),
    /// Entries from a grouping document
    ProteinInference(ProteinInferenceMap),
}

/// Callbacks fired by [`DocumentReader::drive`]
pub trait ElementHandler {
    /// An element was opened
    fn element_open(&mut self, name: &str, attributes: &Attributes) -> Result<(), ParseError>;

    /// An element was closed; nesting has already been validated
    fn element_close(&mut self, name: &str) -> Result<(), ParseError>;
}

/// Number of open and close events delivered to a handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    /// Element-open events
    pub opened: usize,
    /// Element-close events
    pub closed: usize,
}

/// Streaming reader that validates nesting and dispatches element events
pub struct DocumentReader<R: BufRead> {
    reader: Reader<R>,
    stack: ElementStack,
}

impl DocumentReader<Box<dyn BufRead>> {
    /// Open a document on disk; `.gz` files are decompressed on the fly
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if is_gzip(path) {
            gzip_reader(file)?
        } else {
            Box::new(BufReader::with_capacity(DEFAULT_INPUT_BUFFER_SIZE, file))
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> DocumentReader<R> {
    /// Create a reader from a BufRead source
    pub fn new(reader: R) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        let config = xml_reader.config_mut();
        config.trim_text(true);
        // Nesting is validated against our own stack so the error names both elements
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        Self {
            reader: xml_reader,
            stack: ElementStack::new(),
        }
    }

    /// Feed every element event of the document to `handler`
    pub fn drive<H: ElementHandler + ?Sized>(
        &mut self,
        handler: &mut H,
    ) -> Result<EventCounts, ParseError> {
        let mut counts = EventCounts::default();
        let mut buf = Vec::new();

        loop {
            let position = self.reader.buffer_position() as u64;
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let qualified = std::str::from_utf8(e.name().as_ref())?.to_string();
                    let local = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                    let attributes = Attributes::from_start(e, self.reader.decoder())?;
                    self.stack.push(&qualified);
                    counts.opened += 1;
                    handler.element_open(&local, &attributes)?;
                }
                Ok(Event::Empty(ref e)) => {
                    let local = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                    let attributes = Attributes::from_start(e, self.reader.decoder())?;
                    counts.opened += 1;
                    handler.element_open(&local, &attributes)?;
                    counts.closed += 1;
                    handler.element_close(&local)?;
                }
                Ok(Event::End(ref e)) => {
                    let qualified = std::str::from_utf8(e.name().as_ref())?.to_string();
                    let local = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                    self.stack.pop(&qualified, position)?;
                    counts.closed += 1;
                    handler.element_close(&local)?;
                }
                Ok(Event::Eof) => {
                    self.stack.finish(self.reader.buffer_position() as u64)?;
                    return Ok(counts);
                }
                Err(e) => return Err(ParseError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Decode an identification document.
    ///
    /// When `accessions` is supplied, every match that clears the parse cutoff
    /// is assigned a peptide accession.
    pub fn read_identifications(
        mut self,
        options: &IdentificationOptions,
        accessions: Option<&mut dyn AccessionSource>,
    ) -> Result<(Vec<IdentificationRecord>, IdentificationStats), ParseError> {
        let mut handler = identification::IdentificationHandler::new(options, accessions);
        self.drive(&mut handler)?;
        Ok(handler.into_parts())
    }

    /// Decode a grouping document
    pub fn read_protein_inference(
        mut self,
        options: &GroupingOptions,
    ) -> Result<(ProteinInferenceMap, GroupingStats), ParseError> {
        let mut handler = grouping::GroupingHandler::new(options);
        self.drive(&mut handler)?;
        Ok(handler.into_parts())
    }

    /// Decode a document of the declared kind
    pub fn read(
        self,
        kind: DocumentKind,
        identification: &IdentificationOptions,
        grouping: &GroupingOptions,
        accessions: Option<&mut dyn AccessionSource>,
    ) -> Result<ParsedDocument, ParseError> {
        match kind {
            DocumentKind::Identification => self
                .read_identifications(identification, accessions)
                .map(|(records, _)| ParsedDocument::Identifications(records)),
            DocumentKind::Grouping => self
                .read_protein_inference(grouping)
                .map(|(entries, _)| ParsedDocument::ProteinInference(entries)),
        }
    }
}

/// Parse an identification document on disk
pub fn parse_identification_file<P: AsRef<Path>>(
    path: P,
    options: &IdentificationOptions,
    accessions: Option<&mut dyn AccessionSource>,
) -> Result<(Vec<IdentificationRecord>, IdentificationStats), ParseError> {
    DocumentReader::open(path)?.read_identifications(options, accessions)
}

/// Parse a grouping document on disk
pub fn parse_grouping_file<P: AsRef<Path>>(
    path: P,
    options: &GroupingOptions,
) -> Result<(ProteinInferenceMap, GroupingStats), ParseError> {
    DocumentReader::open(path)?.read_protein_inference(options)
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

#[cfg(feature = "gzip")]
fn gzip_reader(file: File) -> Result<Box<dyn BufRead>, ParseError> {
    let decoder = flate2::read::MultiGzDecoder::new(file);
    Ok(Box::new(BufReader::with_capacity(
        DEFAULT_INPUT_BUFFER_SIZE,
        decoder,
    )))
}

#[cfg(not(feature = "gzip"))]
fn gzip_reader(_file: File) -> Result<Box<dyn BufRead>, ParseError> {
    Err(ParseError::IoError(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "gzip input requires the gzip feature",
    )))
}
