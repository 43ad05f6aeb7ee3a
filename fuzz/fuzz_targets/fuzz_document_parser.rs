#![no_main]

use libfuzzer_sys::fuzz_target;
use pepatlas::parser::{DocumentReader, GroupingOptions, IdentificationOptions};
use pepatlas::registry::{AccessionSource, MemoryAccessionRegistry};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Both document kinds must either decode or fail with an error, never panic
    let options = IdentificationOptions::new(1, 0.9);
    let mut registry = MemoryAccessionRegistry::default();
    let accessions: &mut dyn AccessionSource = &mut registry;
    let _ = DocumentReader::new(Cursor::new(data)).read_identifications(&options, Some(accessions));

    let options = GroupingOptions::new(Some(1), 0.9);
    let _ = DocumentReader::new(Cursor::new(data)).read_protein_inference(&options);
});
