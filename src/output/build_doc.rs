use std::io::Write;

use quick_xml::escape::escape;

use super::{format_probability, format_siblings, OutputError};
use crate::coalesce::{join_ids, PeptideSummary};
use crate::registry::BiosequenceAttributes;

const INDENT: usize = 4;
const ATTRIBUTE_INDENT: usize = 8;

/// Streaming writer for the nested build document.
///
/// Keeps its own stack of open elements; closing anything but the innermost
/// open element is an [`OutputError::TagMismatch`].
pub struct BuildDocumentWriter<W: Write> {
    writer: W,
    stack: Vec<String>,
}

impl<W: Write> BuildDocumentWriter<W> {
    /// Write the XML declaration and open the `build` root
    pub fn new(writer: W) -> Result<Self, OutputError> {
        let mut doc = Self {
            writer,
            stack: Vec::new(),
        };
        writeln!(doc.writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        doc.open_element("build", &[])?;
        Ok(doc)
    }

    /// Open an element. Attributes with empty values are omitted.
    pub fn open_element(&mut self, name: &str, attributes: &[(&str, String)]) -> Result<(), OutputError> {
        self.write_tag(name, attributes, false)?;
        self.stack.push(name.to_string());
        Ok(())
    }

    /// Write a self-closing element
    pub fn empty_element(&mut self, name: &str, attributes: &[(&str, String)]) -> Result<(), OutputError> {
        self.write_tag(name, attributes, true)
    }

    /// Close `name`, which must be the innermost open element
    pub fn close_element(&mut self, name: &str) -> Result<(), OutputError> {
        match self.stack.last() {
            Some(top) if top == name => {
                self.stack.pop();
                let indent = self.stack.len() * INDENT;
                writeln!(self.writer, "{:indent$}</{}>", "", name, indent = indent)?;
                Ok(())
            }
            top => Err(OutputError::TagMismatch {
                expected: top.cloned(),
                found: name.to_string(),
            }),
        }
    }

    fn write_tag(
        &mut self,
        name: &str,
        attributes: &[(&str, String)],
        self_closing: bool,
    ) -> Result<(), OutputError> {
        let indent = self.stack.len() * INDENT;
        let terminator = if self_closing { "/>" } else { ">" };
        let present: Vec<&(&str, String)> =
            attributes.iter().filter(|(_, value)| !value.is_empty()).collect();

        if present.is_empty() {
            writeln!(self.writer, "{:indent$}<{}{}", "", name, terminator, indent = indent)?;
            return Ok(());
        }

        writeln!(self.writer, "{:indent$}<{}", "", name, indent = indent)?;
        let attribute_indent = indent + ATTRIBUTE_INDENT;
        for (i, (key, value)) in present.iter().enumerate() {
            let end = if i + 1 == present.len() { terminator } else { "" };
            writeln!(
                self.writer,
                "{:indent$}{}=\"{}\"{}",
                "",
                key,
                escape(value.as_str()),
                end,
                indent = attribute_indent
            )?;
        }
        Ok(())
    }

    /// Write one `peptide_instance` with a `modified_peptide_instance` per form.
    /// Missing biosequence attributes are omitted.
    pub fn write_summary(
        &mut self,
        summary: &PeptideSummary,
        biosequence: Option<&BiosequenceAttributes>,
    ) -> Result<(), OutputError> {
        let (accession, gene_name, description) = match biosequence {
            Some(b) => (b.accession.clone(), b.gene_name.clone(), b.description.clone()),
            None => Default::default(),
        };
        let attributes = [
            ("original_protein_name", summary.protein_name.clone()),
            ("biosequence_accession", accession),
            ("biosequence_gene_name", gene_name),
            ("biosequence_desc", description),
            (
                "peptide_accession",
                summary.peptide_accession.clone().unwrap_or_default(),
            ),
            ("peptide_prev_aa", summary.preceding_residue.clone()),
            ("peptide_sequence", summary.peptide_sequence.clone()),
            ("peptide_next_aa", summary.following_residue.clone()),
            ("best_probability", format_probability(summary.best_probability)),
            (
                "best_adjusted_probability",
                summary
                    .best_adjusted_probability
                    .map(format_probability)
                    .unwrap_or_default(),
            ),
            ("n_observations", summary.n_instances.to_string()),
            (
                "n_adjusted_observations",
                summary.n_adjusted_observations.to_string(),
            ),
            ("n_sibling_peptides", format_siblings(summary.n_sibling_peptides)),
            ("n_experiments", summary.n_experiments().to_string()),
            ("search_batch_ids", summary.experiment_list()),
        ];
        self.open_element("peptide_instance", &attributes)?;

        for (sequence, charge, form) in summary.forms() {
            let attributes = [
                ("peptide_string", sequence.to_string()),
                (
                    "charge_state",
                    charge.map(|c| c.to_string()).unwrap_or_default(),
                ),
                ("best_probability", format_probability(form.best_probability)),
                (
                    "best_adjusted_probability",
                    form.best_adjusted_probability
                        .map(format_probability)
                        .unwrap_or_default(),
                ),
                ("n_observations", form.n_instances.to_string()),
                (
                    "n_adjusted_observations",
                    form.n_adjusted_observations.to_string(),
                ),
                ("n_sibling_peptides", format_siblings(form.n_sibling_peptides)),
                ("search_batch_ids", join_ids(&form.experiments)),
            ];
            self.empty_element("modified_peptide_instance", &attributes)?;
        }

        self.close_element("peptide_instance")
    }

    /// Close the root, verify nothing else is open and return the inner writer
    pub fn finish(mut self) -> Result<W, OutputError> {
        if self.stack.len() > 1 {
            return Err(OutputError::UnclosedElements(self.stack[1..].join(" > ")));
        }
        self.close_element("build")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
