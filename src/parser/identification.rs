use log::debug;

use super::{Attributes, ElementHandler, ParseError};
use crate::model::{ExperimentId, IdentificationRecord, ModificationSet};
use crate::registry::AccessionSource;

/// Matches at or below this probability are discarded while parsing.
///
/// Deliberately permissive: a later refinement step can raise a match's
/// probability well above its parse-time value.
pub const PARSE_PROBABILITY_CUTOFF: f64 = 0.50;

/// Settings for decoding one identification document
#[derive(Debug, Clone)]
pub struct IdentificationOptions {
    /// Experiment the document belongs to
    pub experiment_id: ExperimentId,
    /// Minimum probability for a match to be kept
    pub probability_threshold: f64,
}

impl IdentificationOptions {
    /// Options for one experiment
    pub fn new(experiment_id: ExperimentId, probability_threshold: f64) -> Self {
        Self {
            experiment_id,
            probability_threshold,
        }
    }
}

/// Counters collected while decoding an identification document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentificationStats {
    /// spectrum_query elements seen
    pub spectra: usize,
    /// Spectra without a search result (emitted as sentinel records)
    pub unmatched: usize,
    /// Matches at or below the parse cutoff
    pub below_cutoff: usize,
    /// Matches above the cutoff but below the caller's threshold
    pub below_threshold: usize,
    /// Matches kept
    pub retained: usize,
}

#[derive(Debug, Default)]
struct SearchHit {
    sequence: String,
    preceding_residue: String,
    following_residue: String,
    protein_name: String,
    mass_difference: Option<f64>,
}

/// Per-spectrum accumulator, reset whenever a spectrum_query opens
#[derive(Debug, Default)]
struct SpectrumScratch {
    spectrum_id: String,
    charge: Option<u8>,
    search_results: usize,
    hit: Option<SearchHit>,
    /// Inside a search_hit ranked below the first one
    in_secondary_hit: bool,
    probability: Option<f64>,
    modifications: ModificationSet,
}

pub(super) struct IdentificationHandler<'a, 'r> {
    options: &'a IdentificationOptions,
    accessions: Option<&'r mut dyn AccessionSource>,
    spectrum: Option<SpectrumScratch>,
    records: Vec<IdentificationRecord>,
    stats: IdentificationStats,
}

impl<'a, 'r> IdentificationHandler<'a, 'r> {
    pub(super) fn new(
        options: &'a IdentificationOptions,
        accessions: Option<&'r mut dyn AccessionSource>,
    ) -> Self {
        Self {
            options,
            accessions,
            spectrum: None,
            records: Vec::new(),
            stats: IdentificationStats::default(),
        }
    }

    pub(super) fn into_parts(self) -> (Vec<IdentificationRecord>, IdentificationStats) {
        (self.records, self.stats)
    }

    fn open_search_hit(
        scratch: &mut SpectrumScratch,
        attributes: &Attributes,
    ) -> Result<(), ParseError> {
        let rank: u32 = attributes.parse("search_hit", "hit_rank")?.unwrap_or(1);
        if scratch.hit.is_some() || rank > 1 {
            scratch.in_secondary_hit = true;
            return Ok(());
        }
        scratch.hit = Some(SearchHit {
            sequence: attributes.get("peptide").unwrap_or_default().trim().to_string(),
            preceding_residue: attributes.get("peptide_prev_aa").unwrap_or_default().to_string(),
            following_residue: attributes.get("peptide_next_aa").unwrap_or_default().to_string(),
            protein_name: attributes.get("protein").unwrap_or_default().to_string(),
            mass_difference: attributes.parse("search_hit", "massdiff")?,
        });
        Ok(())
    }

    fn open_modification_info(
        scratch: &mut SpectrumScratch,
        attributes: &Attributes,
    ) -> Result<(), ParseError> {
        let length = scratch
            .hit
            .as_ref()
            .map(|hit| hit.sequence.chars().count())
            .unwrap_or(0);
        if let Some(mass) = attributes.parse("modification_info", "mod_nterm_mass")? {
            scratch.modifications.insert(0, mass);
        }
        if let Some(mass) = attributes.parse("modification_info", "mod_cterm_mass")? {
            scratch.modifications.insert(length + 1, mass);
        }
        Ok(())
    }

    fn open_mod_aminoacid_mass(
        scratch: &mut SpectrumScratch,
        attributes: &Attributes,
    ) -> Result<(), ParseError> {
        let position: Option<usize> = attributes.parse("mod_aminoacid_mass", "position")?;
        let mass: Option<f64> = attributes.parse("mod_aminoacid_mass", "mass")?;
        if let (Some(position), Some(mass)) = (position, mass) {
            scratch.modifications.insert(position, mass);
        }
        Ok(())
    }

    /// Turn the finished spectrum into a record, or drop it
    fn close_spectrum(&mut self, scratch: SpectrumScratch) -> Result<(), ParseError> {
        let hit = match scratch.hit {
            Some(hit) => hit,
            None => {
                self.stats.unmatched += 1;
                self.records.push(IdentificationRecord::unmatched(
                    self.options.experiment_id,
                    scratch.spectrum_id,
                    scratch.charge,
                ));
                return Ok(());
            }
        };

        let probability = match scratch.probability {
            Some(p) if p > PARSE_PROBABILITY_CUTOFF => p,
            _ => {
                self.stats.below_cutoff += 1;
                return Ok(());
            }
        };

        let modified_sequence = scratch.modifications.annotate(&hit.sequence);
        let peptide_accession = match self.accessions.as_deref_mut() {
            Some(registry) => Some(registry.accession_for(&hit.sequence)?),
            None => None,
        };

        if probability < self.options.probability_threshold {
            self.stats.below_threshold += 1;
            return Ok(());
        }

        self.stats.retained += 1;
        self.records.push(IdentificationRecord {
            experiment_id: self.options.experiment_id,
            spectrum_id: scratch.spectrum_id,
            peptide_accession,
            stripped_sequence: hit.sequence,
            preceding_residue: hit.preceding_residue,
            modified_sequence,
            following_residue: hit.following_residue,
            charge: scratch.charge,
            probability: Some(probability),
            mass_difference: hit.mass_difference,
            protein_name: hit.protein_name,
            adjustment: None,
        });
        Ok(())
    }
}

impl ElementHandler for IdentificationHandler<'_, '_> {
    fn element_open(&mut self, name: &str, attributes: &Attributes) -> Result<(), ParseError> {
        if name == "spectrum_query" {
            self.stats.spectra += 1;
            self.spectrum = Some(SpectrumScratch {
                spectrum_id: attributes.get("spectrum").unwrap_or_default().to_string(),
                charge: attributes.parse("spectrum_query", "assumed_charge")?,
                ..Default::default()
            });
            return Ok(());
        }

        let scratch = match self.spectrum.as_mut() {
            Some(scratch) => scratch,
            None => return Ok(()),
        };

        if name == "search_hit" {
            return Self::open_search_hit(scratch, attributes);
        }
        if scratch.in_secondary_hit {
            return Ok(());
        }

        match name {
            "search_result" => {
                scratch.search_results += 1;
                if scratch.search_results > 1 {
                    return Err(ParseError::MultipleSearchResults {
                        spectrum: scratch.spectrum_id.clone(),
                    });
                }
            }
            "modification_info" => Self::open_modification_info(scratch, attributes)?,
            "mod_aminoacid_mass" => Self::open_mod_aminoacid_mass(scratch, attributes)?,
            // Later elements overwrite earlier ones: a refinement result that
            // follows the primary one takes precedence.
            "search_score" | "parameter" => {
                if attributes.get("name") == Some("probability") {
                    if let Some(p) = attributes.parse(name, "value")? {
                        scratch.probability = Some(p);
                    }
                }
            }
            "peptideprophet_result" | "interprophet_result" => {
                if let Some(p) = attributes.parse(name, "probability")? {
                    scratch.probability = Some(p);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn element_close(&mut self, name: &str) -> Result<(), ParseError> {
        match name {
            "spectrum_query" => {
                if let Some(scratch) = self.spectrum.take() {
                    self.close_spectrum(scratch)?;
                }
            }
            "search_hit" => {
                if let Some(scratch) = self.spectrum.as_mut() {
                    scratch.in_secondary_hit = false;
                }
            }
            "msms_run_summary" => {
                debug!(
                    "Finished run summary: {} spectra, {} retained",
                    self.stats.spectra, self.stats.retained
                );
            }
            _ => {}
        }
        Ok(())
    }
}
